// Lumen Browser Library Entry Point
// This file exposes all modules so they can be imported by main.rs
// and tested independently.

pub mod settings;
pub mod theme;

// Shared state
pub mod state;

// Pure logic modules (no Tauri imports)
pub mod modules;

// Controller tying preferences, tabs and the engine together
pub mod browser;

#[cfg(feature = "desktop")]
pub mod desktop;

#[cfg(feature = "desktop")]
pub use desktop::run;
