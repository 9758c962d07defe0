// Module exports for pure logic
pub mod engine;              // Rendering engine seam
pub mod events;              // Engine -> controller channel
pub mod navigation;
pub mod profiles;            // Persistent and incognito profiles
pub mod tabs;                // Tab registry
