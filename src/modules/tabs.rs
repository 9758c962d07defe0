// Tab registry - pure logic, no Tauri imports.
// Ordered open tabs, the active selection, and the incognito group toggle.

use crate::modules::events::EngineEvent;
use crate::modules::profiles::{ProfileKind, ProfileRegistry};
use crate::state::{LoadState, Tab, TabId};

pub const NEW_TAB_LABEL: &str = "New Tab";
pub const INCOGNITO_LABEL: &str = "Incognito";

impl Tab {
    /// Label shown in the tab strip once a load has finished. Incognito tabs
    /// never reveal the page title.
    pub fn display_label(&self) -> String {
        if self.is_incognito {
            return INCOGNITO_LABEL.to_string();
        }
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.clone(),
            _ => self.url.clone(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum IncognitoToggle {
    /// A fresh incognito tab was opened at this index.
    Opened(usize),
    /// Every incognito tab was removed, last one first.
    Closed(Vec<Tab>),
}

/// Where an engine event landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedEvent {
    pub index: usize,
    /// The tab was the active one when the event was applied.
    pub active: bool,
}

#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    active: Option<usize>,
    next_id: u64,
    profiles: ProfileRegistry,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tab> {
        self.tabs.get(index)
    }

    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn current_tab(&self) -> Option<&Tab> {
        self.active.and_then(|i| self.tabs.get(i))
    }

    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    pub fn has_incognito(&self) -> bool {
        self.tabs.iter().any(|t| t.is_incognito)
    }

    /// Ids of the open tabs bound to `profile`, in tab order.
    pub fn tabs_in_profile(&self, profile: ProfileKind) -> Vec<TabId> {
        self.tabs
            .iter()
            .filter(|t| t.profile == profile)
            .map(|t| t.id)
            .collect()
    }

    /// Appends a tab, makes it active and returns its index.
    pub fn add_tab(&mut self, url: &str, incognito: bool, title: Option<&str>) -> usize {
        if incognito {
            self.profiles.begin_incognito_session();
        }

        let id = TabId(self.next_id);
        self.next_id += 1;

        let label = match title {
            Some(t) => t.to_string(),
            None if incognito => INCOGNITO_LABEL.to_string(),
            None => NEW_TAB_LABEL.to_string(),
        };

        self.tabs.push(Tab {
            id,
            profile: ProfileKind::for_tab(incognito),
            is_incognito: incognito,
            url: url.to_string(),
            title: None,
            label,
            load_state: LoadState::Loading,
        });

        let index = self.tabs.len() - 1;
        self.active = Some(index);
        log::debug!("[Tabs] Opened {} at index {} ({})", id, index, url);
        index
    }

    /// Removes the tab at `index`. Closing the last tab is allowed and leaves
    /// the registry empty.
    pub fn close_tab(&mut self, index: usize) -> Option<Tab> {
        let removed = self.remove_at(index)?;
        if removed.is_incognito && !self.has_incognito() {
            self.profiles.end_incognito_session();
        }
        Some(removed)
    }

    /// Returns false when `index` is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.tabs.len() {
            return false;
        }
        self.active = Some(index);
        true
    }

    /// Opens one incognito tab at `home` when none exists, otherwise closes
    /// all of them in one pass.
    pub fn toggle_incognito_group(&mut self, home: &str) -> IncognitoToggle {
        if !self.has_incognito() {
            let index = self.add_tab(home, true, Some(INCOGNITO_LABEL));
            return IncognitoToggle::Opened(index);
        }

        let mut closed = Vec::new();
        for index in (0..self.tabs.len()).rev() {
            if self.tabs[index].is_incognito {
                if let Some(tab) = self.remove_at(index) {
                    closed.push(tab);
                }
            }
        }
        self.profiles.end_incognito_session();
        IncognitoToggle::Closed(closed)
    }

    /// Folds an engine notification into the tab it belongs to. Events for
    /// tabs that no longer exist are dropped.
    pub fn apply_event(&mut self, event: &EngineEvent) -> Option<AppliedEvent> {
        let index = self.index_of(event.tab())?;
        let active = self.active == Some(index);
        let tab = &mut self.tabs[index];

        match event {
            EngineEvent::UrlChanged { url, .. } => tab.url = url.clone(),
            EngineEvent::LoadStarted { .. } => tab.load_state = LoadState::Loading,
            EngineEvent::LoadFinished { title, .. } => {
                tab.load_state = LoadState::Loaded;
                if !tab.is_incognito {
                    tab.title = title.clone();
                }
                tab.label = tab.display_label();
            }
        }

        Some(AppliedEvent { index, active })
    }

    fn remove_at(&mut self, index: usize) -> Option<Tab> {
        if index >= self.tabs.len() {
            return None;
        }
        let removed = self.tabs.remove(index);

        // The right neighbour slides into the removed slot and takes over.
        self.active = match self.active {
            _ if self.tabs.is_empty() => None,
            Some(a) if a > index => Some(a - 1),
            Some(a) if a == index => Some(index.min(self.tabs.len() - 1)),
            other => other,
        };

        log::debug!("[Tabs] Closed {} at index {}", removed.id, index);
        Some(removed)
    }
}
