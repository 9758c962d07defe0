// Shared state structs to avoid circular dependencies.
// These are used by the browser controller and the desktop shell.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::modules::profiles::ProfileKind;

#[cfg(feature = "desktop")]
use std::sync::Mutex;

#[cfg(feature = "desktop")]
use crate::{browser::Browser, desktop::TauriAdapter};

/// Stable tab identity. Never reused within a run, so engine callbacks that
/// arrive after a tab has closed or moved cannot hit the wrong tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub u64);

impl TabId {
    pub fn webview_label(&self) -> String {
        format!("tab-{}", self.0)
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Loading,
    Loaded,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Tab {
    pub id: TabId,
    pub profile: ProfileKind,
    pub is_incognito: bool,
    pub url: String,
    /// Last page title reported by the engine. Never recorded for incognito tabs.
    pub title: Option<String>,
    pub label: String,
    pub load_state: LoadState,
}

#[cfg(feature = "desktop")]
pub struct AppState {
    pub browser: Mutex<Browser<TauriAdapter>>,
}

#[cfg(feature = "desktop")]
impl AppState {
    pub fn new(browser: Browser<TauriAdapter>) -> Self {
        Self {
            browser: Mutex::new(browser),
        }
    }
}
