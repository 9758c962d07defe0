// Pure navigation logic - no Tauri imports allowed.
// Input resolution, toolbar navigation on the active tab, address bar sync.

use serde::Serialize;

use crate::modules::engine::EngineAdapter;
use crate::modules::tabs::{AppliedEvent, TabRegistry};
use crate::settings::{PreferenceStore, SearchEngine, UnknownSearchEngine};
use crate::state::TabId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Text passed to the engine exactly as typed.
    Address(String),
    /// Query URL built from the search engine's template.
    Search(String),
}

impl Destination {
    pub fn url(&self) -> &str {
        match self {
            Self::Address(url) | Self::Search(url) => url,
        }
    }
}

/// Logic for turning address bar input into a destination.
///
/// Text without a `.` is a search query; anything else is an address. No
/// scheme is added and nothing is validated here: malformed addresses go to
/// the engine, which shows its own error page. This is purely local string
/// handling, no lookups of any kind.
pub fn resolve_input(input: &str, engine: SearchEngine) -> Destination {
    if input.contains('.') {
        Destination::Address(input.to_string())
    } else {
        Destination::Search(engine.query_url(input))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressBar {
    pub text: String,
    pub cursor: usize,
}

impl AddressBar {
    /// Shows `url` with the cursor at the start so the scheme and host stay visible.
    pub fn show(&mut self, url: &str) {
        self.text = url.to_string();
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.show("");
    }

    /// URL change reported by the engine. Only the tab that is active when
    /// the event is processed may touch the address bar; returns whether it did.
    pub fn on_url_changed(&mut self, applied: AppliedEvent, url: &str) -> bool {
        if !applied.active {
            return false;
        }
        self.show(url);
        true
    }
}

/// Toolbar navigation. Every action targets the active tab and quietly does
/// nothing when there is none.
pub struct Navigator<'a, A: EngineAdapter + ?Sized> {
    tabs: &'a TabRegistry,
    prefs: &'a mut PreferenceStore,
    engine: &'a mut A,
}

impl<'a, A: EngineAdapter + ?Sized> Navigator<'a, A> {
    pub fn new(tabs: &'a TabRegistry, prefs: &'a mut PreferenceStore, engine: &'a mut A) -> Self {
        Self { tabs, prefs, engine }
    }

    fn active(&self) -> Option<TabId> {
        self.tabs.current_tab().map(|t| t.id)
    }

    pub fn home_url(&self) -> &'static str {
        self.prefs.search_engine().home_url()
    }

    pub fn navigate(&mut self, input: &str) -> Option<Destination> {
        let tab = self.active()?;
        let destination = resolve_input(input, self.prefs.search_engine());
        log::info!("[Navigation] {} -> {}", tab, destination.url());
        self.engine.load_url(tab, destination.url());
        Some(destination)
    }

    /// Persists the choice, then opens the engine's home page in the active tab.
    pub fn select_search_engine(&mut self, engine: SearchEngine) {
        self.prefs.set_search_engine(engine);
        if let Some(tab) = self.active() {
            self.engine.load_url(tab, engine.home_url());
        }
    }

    pub fn select_search_engine_by_name(&mut self, name: &str) -> Result<(), UnknownSearchEngine> {
        let engine = name.parse()?;
        self.select_search_engine(engine);
        Ok(())
    }

    pub fn go_home(&mut self) {
        if let Some(tab) = self.active() {
            let home = self.home_url();
            self.engine.load_url(tab, home);
        }
    }

    pub fn back(&mut self) {
        if let Some(tab) = self.active() {
            self.engine.go_back(tab);
        }
    }

    pub fn forward(&mut self) {
        if let Some(tab) = self.active() {
            self.engine.go_forward(tab);
        }
    }

    pub fn reload(&mut self) {
        if let Some(tab) = self.active() {
            self.engine.reload(tab);
        }
    }
}
