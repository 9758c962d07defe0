// Browser controller: owns preferences, tabs and the address bar, turns
// toolbar commands into engine calls, and folds engine events back in.

use serde::{Deserialize, Serialize};

use crate::modules::engine::EngineAdapter;
use crate::modules::events::{EngineEvent, EngineEventReceiver};
use crate::modules::navigation::{AddressBar, Navigator};
use crate::modules::tabs::{IncognitoToggle, TabRegistry};
use crate::settings::{PreferenceStore, SearchEngine};
use crate::state::{LoadState, TabId};
use crate::theme::{self, Theme};

/// Toolbar and menu actions. Menu items carry the engine or theme they stand
/// for, so a handler never depends on which loop iteration created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Command {
    Back,
    Forward,
    Reload,
    Home,
    Navigate(String),
    SelectSearchEngine(SearchEngine),
    NewTab,
    ToggleIncognito,
    SetTheme(Theme),
    SetIncognitoColor(Theme),
    DeleteCookies,
    CloseTab(usize),
    SelectTab(usize),
}

impl Command {
    /// Maps a menu item id (`search:Brave`, `theme:red`, `incognito:gray`,
    /// `cookies:delete`) back to its command.
    pub fn from_menu_id(id: &str) -> Option<Self> {
        let (group, value) = id.split_once(':')?;
        match group {
            SEARCH_GROUP => value.parse().ok().map(Self::SelectSearchEngine),
            THEME_GROUP => value.parse().ok().map(Self::SetTheme),
            INCOGNITO_GROUP => value.parse().ok().map(Self::SetIncognitoColor),
            COOKIES_GROUP if value == "delete" => Some(Self::DeleteCookies),
            _ => None,
        }
    }
}

const SEARCH_GROUP: &str = "search";
const THEME_GROUP: &str = "theme";
const INCOGNITO_GROUP: &str = "incognito";
const COOKIES_GROUP: &str = "cookies";

/// Popup menus reachable from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuKind {
    SearchEngine,
    Theme,
    Cookies,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    /// Stable item id, see [`Command::from_menu_id`].
    pub id: String,
    pub label: String,
    pub checked: bool,
}

impl MenuEntry {
    fn new(group: &str, value: &str, label: String, checked: bool) -> Self {
        let label = if checked { format!("{} ✅", label) } else { label };
        Self {
            id: format!("{}:{}", group, value),
            label,
            checked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabView {
    pub id: TabId,
    pub label: String,
    pub style: String,
    pub incognito: bool,
    pub loading: bool,
}

/// Everything the toolbar needs to redraw itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChromeSnapshot {
    pub window_style: String,
    pub tabs: Vec<TabView>,
    pub active_index: Option<usize>,
    pub address: String,
    pub address_cursor: usize,
    pub search_engine: &'static str,
}

pub struct Browser<A: EngineAdapter> {
    prefs: PreferenceStore,
    tabs: TabRegistry,
    address_bar: AddressBar,
    adapter: A,
    events: EngineEventReceiver,
}

impl<A: EngineAdapter> Browser<A> {
    pub fn new(prefs: PreferenceStore, adapter: A, events: EngineEventReceiver) -> Self {
        Self {
            prefs,
            tabs: TabRegistry::new(),
            address_bar: AddressBar::default(),
            adapter,
            events,
        }
    }

    /// Applies the theme and opens the first tab on the search engine's home page.
    pub fn start(&mut self) {
        log::info!(
            "[Browser] Starting with theme {} and search engine {}",
            self.prefs.theme(),
            self.prefs.search_engine()
        );
        self.apply_theme();
        let home = self.home_url();
        self.add_tab(home, false, None);
    }

    pub fn dispatch(&mut self, command: Command) {
        log::debug!("[Browser] {:?}", command);
        match command {
            Command::Back => self.navigator().back(),
            Command::Forward => self.navigator().forward(),
            Command::Reload => self.navigator().reload(),
            Command::Home => self.navigator().go_home(),
            Command::Navigate(input) => {
                self.navigator().navigate(&input);
            }
            Command::SelectSearchEngine(engine) => self.navigator().select_search_engine(engine),
            Command::NewTab => {
                let home = self.home_url();
                self.add_tab(home, false, None);
            }
            Command::ToggleIncognito => self.toggle_incognito(),
            Command::SetTheme(theme) => self.set_theme(theme),
            Command::SetIncognitoColor(color) => self.set_incognito_color(color),
            Command::DeleteCookies => self.delete_cookies(),
            Command::CloseTab(index) => self.close_tab(index),
            Command::SelectTab(index) => self.select_tab(index),
        }
    }

    pub fn navigator(&mut self) -> Navigator<'_, A> {
        Navigator::new(&self.tabs, &mut self.prefs, &mut self.adapter)
    }

    pub fn home_url(&self) -> &'static str {
        self.prefs.search_engine().home_url()
    }

    pub fn add_tab(&mut self, url: &str, incognito: bool, title: Option<&str>) -> usize {
        let index = self.tabs.add_tab(url, incognito, title);
        if let Some(tab) = self.tabs.get(index) {
            let profile = self.tabs.profiles().get(tab.profile);
            self.adapter.open_tab(tab, profile);
            self.adapter.activate_tab(tab.id);
            self.address_bar.show(url);
        }
        self.apply_theme();
        index
    }

    pub fn close_tab(&mut self, index: usize) {
        let before = self.tabs.current_tab().map(|t| t.id);
        if let Some(tab) = self.tabs.close_tab(index) {
            self.adapter.close_tab(tab.id);
            self.after_removal(before);
        }
    }

    pub fn select_tab(&mut self, index: usize) {
        if self.tabs.select(index) {
            self.show_current();
        }
    }

    pub fn toggle_incognito(&mut self) {
        let before = self.tabs.current_tab().map(|t| t.id);
        let home = self.home_url();
        match self.tabs.toggle_incognito_group(home) {
            IncognitoToggle::Opened(index) => {
                if let Some(tab) = self.tabs.get(index) {
                    let profile = self.tabs.profiles().get(tab.profile);
                    self.adapter.open_tab(tab, profile);
                    self.adapter.activate_tab(tab.id);
                }
                self.address_bar.show(home);
                self.apply_theme();
            }
            IncognitoToggle::Closed(closed) => {
                log::info!("[Browser] Closed {} incognito tab(s)", closed.len());
                for tab in &closed {
                    self.adapter.close_tab(tab.id);
                }
                self.after_removal(before);
            }
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.prefs.set_theme(theme);
        self.apply_theme();
    }

    pub fn set_incognito_color(&mut self, color: Theme) {
        self.prefs.set_incognito_color(color);
        self.apply_theme();
    }

    /// Clears cookies for the profile of the active tab.
    pub fn delete_cookies(&mut self) {
        let Some(profile) = self.tabs.current_tab().map(|t| t.profile) else {
            return;
        };
        let ids = self.tabs.tabs_in_profile(profile);
        log::info!("[Browser] Deleting {:?} cookies ({} tab(s))", profile, ids.len());
        self.adapter.delete_all_cookies(profile, &ids);
    }

    pub fn apply_theme(&mut self) {
        theme::apply(self.prefs.preferences(), self.tabs.tabs(), &mut self.adapter);
    }

    /// Drains queued engine events. Returns true when anything changed.
    pub fn pump_events(&mut self) -> bool {
        let events = self.events.drain();
        let mut changed = false;
        for event in events {
            changed |= self.handle_event(event);
        }
        changed
    }

    pub fn handle_event(&mut self, event: EngineEvent) -> bool {
        let Some(applied) = self.tabs.apply_event(&event) else {
            log::debug!("[Browser] Dropping event for closed tab: {:?}", event);
            return false;
        };
        if let EngineEvent::UrlChanged { url, .. } = &event {
            self.address_bar.on_url_changed(applied, url);
        }
        true
    }

    pub fn tabs(&self) -> &TabRegistry {
        &self.tabs
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.prefs
    }

    pub fn address_bar(&self) -> &AddressBar {
        &self.address_bar
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn search_menu(&self) -> Vec<MenuEntry> {
        let selected = self.prefs.search_engine();
        SearchEngine::ALL
            .into_iter()
            .map(|engine| {
                MenuEntry::new(SEARCH_GROUP, engine.name(), engine.name().to_string(), engine == selected)
            })
            .collect()
    }

    pub fn theme_menu(&self) -> Vec<MenuEntry> {
        let selected = self.prefs.theme();
        Theme::ALL
            .into_iter()
            .map(|theme| MenuEntry::new(THEME_GROUP, theme.id(), theme.id().to_string(), theme == selected))
            .collect()
    }

    pub fn incognito_color_menu(&self) -> Vec<MenuEntry> {
        let selected = self.prefs.incognito_color();
        Theme::ALL
            .into_iter()
            .map(|color| {
                let label = format!("Incognito: {}", color.id());
                MenuEntry::new(INCOGNITO_GROUP, color.id(), label, color == selected)
            })
            .collect()
    }

    /// Menu contents as sections, to be separated when rendered.
    pub fn menu(&self, kind: MenuKind) -> Vec<Vec<MenuEntry>> {
        match kind {
            MenuKind::SearchEngine => vec![self.search_menu()],
            MenuKind::Theme => vec![self.theme_menu(), self.incognito_color_menu()],
            MenuKind::Cookies => vec![vec![MenuEntry::new(
                COOKIES_GROUP,
                "delete",
                "Delete Cookies".to_string(),
                false,
            )]],
        }
    }

    pub fn snapshot(&self) -> ChromeSnapshot {
        let prefs = self.prefs.preferences();
        ChromeSnapshot {
            window_style: theme::window_style(prefs).css(),
            tabs: self
                .tabs
                .tabs()
                .iter()
                .map(|tab| TabView {
                    id: tab.id,
                    label: tab.label.clone(),
                    style: theme::tab_style(prefs, tab).css(),
                    incognito: tab.is_incognito,
                    loading: tab.load_state == LoadState::Loading,
                })
                .collect(),
            active_index: self.tabs.active_index(),
            address: self.address_bar.text.clone(),
            address_cursor: self.address_bar.cursor,
            search_engine: self.prefs.search_engine().name(),
        }
    }

    /// Re-shows whatever is active after tabs were removed.
    fn after_removal(&mut self, before: Option<TabId>) {
        let now = self.tabs.current_tab().map(|t| t.id);
        if now.is_none() {
            self.address_bar.clear();
        } else if now != before {
            self.show_current();
        }
    }

    fn show_current(&mut self) {
        if let Some(tab) = self.tabs.current_tab() {
            self.adapter.activate_tab(tab.id);
            self.address_bar.show(&tab.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::engine::testing::{Call, RecordingAdapter};
    use crate::modules::events::{self, EngineEventSender};
    use crate::modules::profiles::ProfileKind;
    use crate::modules::tabs::INCOGNITO_LABEL;
    use crate::settings::MemoryStorage;
    use rstest::rstest;

    fn started_browser(storage: MemoryStorage) -> (Browser<RecordingAdapter>, EngineEventSender) {
        let (tx, rx) = events::channel();
        let prefs = PreferenceStore::new(Box::new(storage));
        let mut browser = Browser::new(prefs, RecordingAdapter::default(), rx);
        browser.start();
        (browser, tx)
    }

    fn id_at(browser: &Browser<RecordingAdapter>, index: usize) -> TabId {
        browser.tabs().tabs()[index].id
    }

    #[test]
    fn test_start_opens_engine_home() {
        let storage = MemoryStorage::with_contents(r#"{"search_engine": "Bing"}"#);
        let (browser, _tx) = started_browser(storage);

        assert_eq!(browser.tabs().len(), 1);
        assert_eq!(browser.tabs().current_tab().unwrap().url, "https://www.bing.com/?cc=us");
        assert_eq!(browser.address_bar().text, "https://www.bing.com/?cc=us");
        assert_eq!(browser.adapter().window_style, Some(Theme::White.style()));
        assert!(browser.adapter().tab_styles.contains_key(&id_at(&browser, 0)));
    }

    #[test]
    fn test_navigate_cats_with_duckduckgo() {
        let storage = MemoryStorage::with_contents(r#"{"search_engine": "DuckDuckGo"}"#);
        let (mut browser, _tx) = started_browser(storage);
        browser.adapter_mut().take_calls();

        browser.dispatch(Command::Navigate("cats".into()));
        browser.dispatch(Command::Navigate("example.com".into()));

        let id = id_at(&browser, 0);
        assert_eq!(
            browser.adapter_mut().take_calls(),
            vec![
                Call::Load(id, "https://duckduckgo.com/?kl=us-en&q=cats".into()),
                Call::Load(id, "example.com".into()),
            ]
        );
    }

    #[test]
    fn test_closing_only_tab_then_controls_are_noops() {
        let (mut browser, _tx) = started_browser(MemoryStorage::new());
        browser.dispatch(Command::CloseTab(0));
        assert!(browser.tabs().current_tab().is_none());
        assert_eq!(browser.address_bar().text, "");
        browser.adapter_mut().take_calls();

        for command in [
            Command::Back,
            Command::Forward,
            Command::Reload,
            Command::Home,
            Command::Navigate("cats".into()),
            Command::DeleteCookies,
            Command::CloseTab(0),
            Command::SelectTab(0),
        ] {
            browser.dispatch(command);
        }
        assert!(browser.adapter().calls.is_empty());
    }

    #[test]
    fn test_incognito_toggle_round_trip() {
        let (mut browser, _tx) = started_browser(MemoryStorage::new());
        browser.dispatch(Command::ToggleIncognito);

        let incognito = id_at(&browser, 1);
        assert!(browser.tabs().current_tab().unwrap().is_incognito);
        assert!(browser
            .adapter()
            .calls
            .contains(&Call::Open { tab: incognito, url: "https://www.google.com/ncr".into(), incognito: true }));

        browser.dispatch(Command::ToggleIncognito);
        assert!(!browser.tabs().has_incognito());
        assert_eq!(browser.tabs().len(), 1);

        let calls = browser.adapter_mut().take_calls();
        let tail: Vec<_> = calls.iter().rev().take(2).cloned().collect();
        assert_eq!(tail, vec![Call::Activate(id_at(&browser, 0)), Call::Close(incognito)]);
    }

    #[test]
    fn test_incognito_label_after_load() {
        let (mut browser, tx) = started_browser(MemoryStorage::new());
        browser.dispatch(Command::ToggleIncognito);
        let incognito = id_at(&browser, 1);

        tx.send(EngineEvent::LoadStarted { tab: incognito });
        tx.send(EngineEvent::LoadFinished { tab: incognito, title: Some("Bank Login".into()) });
        assert!(browser.pump_events());

        let snapshot = browser.snapshot();
        assert_eq!(snapshot.tabs[1].label, INCOGNITO_LABEL);
        assert!(!snapshot.tabs[1].loading);
    }

    #[test]
    fn test_background_url_change_keeps_address_bar() {
        let (mut browser, tx) = started_browser(MemoryStorage::new());
        browser.dispatch(Command::NewTab);
        let background = id_at(&browser, 0);
        let active = id_at(&browser, 1);

        tx.send(EngineEvent::UrlChanged { tab: background, url: "https://background.example/".into() });
        browser.pump_events();
        assert_eq!(browser.address_bar().text, "https://www.google.com/ncr");

        tx.send(EngineEvent::UrlChanged { tab: active, url: "https://active.example/".into() });
        browser.pump_events();
        assert_eq!(browser.address_bar().text, "https://active.example/");

        // Switching back shows the URL the background tab reached meanwhile.
        browser.dispatch(Command::SelectTab(0));
        assert_eq!(browser.address_bar().text, "https://background.example/");
        assert_eq!(browser.address_bar().cursor, 0);
    }

    #[test]
    fn test_events_for_closed_tabs_are_ignored() {
        let (mut browser, tx) = started_browser(MemoryStorage::new());
        let gone = id_at(&browser, 0);
        browser.dispatch(Command::CloseTab(0));

        tx.send(EngineEvent::UrlChanged { tab: gone, url: "https://late.example/".into() });
        assert!(!browser.pump_events());
        assert_eq!(browser.address_bar().text, "");
    }

    #[rstest]
    #[case(Theme::Blue, Theme::Red)]
    #[case(Theme::Gray, Theme::Gray)]
    fn test_theme_commands_restyle_and_persist(#[case] theme: Theme, #[case] accent: Theme) {
        let storage = MemoryStorage::new();
        let (mut browser, _tx) = started_browser(storage.clone());
        browser.dispatch(Command::ToggleIncognito);

        browser.dispatch(Command::SetTheme(theme));
        browser.dispatch(Command::SetIncognitoColor(accent));

        let normal = id_at(&browser, 0);
        let incognito = id_at(&browser, 1);
        assert_eq!(browser.adapter().window_style, Some(theme.style()));
        assert_eq!(browser.adapter().tab_styles[&normal], theme.style());
        assert_eq!(browser.adapter().tab_styles[&incognito], accent.incognito_style());

        let reloaded = PreferenceStore::new(Box::new(storage));
        assert_eq!(reloaded.theme(), theme);
        assert_eq!(reloaded.incognito_color(), accent);
    }

    #[test]
    fn test_new_tab_gets_current_theme() {
        let storage = MemoryStorage::with_contents(r#"{"theme": "orange"}"#);
        let (mut browser, _tx) = started_browser(storage);
        browser.dispatch(Command::NewTab);

        let id = id_at(&browser, 1);
        assert_eq!(browser.adapter().tab_styles[&id], Theme::Orange.style());
    }

    #[test]
    fn test_select_search_engine_command() {
        let storage = MemoryStorage::new();
        let (mut browser, _tx) = started_browser(storage.clone());
        browser.adapter_mut().take_calls();

        browser.dispatch(Command::SelectSearchEngine(SearchEngine::DuckDuckGo));

        let id = id_at(&browser, 0);
        assert_eq!(
            browser.adapter_mut().take_calls(),
            vec![Call::Load(id, "https://duckduckgo.com/?kl=us-en".into())]
        );
        let menu = browser.search_menu();
        let checked: Vec<_> = menu.iter().filter(|e| e.checked).map(|e| e.label.as_str()).collect();
        assert_eq!(checked, vec!["DuckDuckGo ✅"]);
        assert_eq!(PreferenceStore::new(Box::new(storage)).search_engine(), SearchEngine::DuckDuckGo);
    }

    #[test]
    fn test_delete_cookies_uses_active_profile() {
        let (mut browser, _tx) = started_browser(MemoryStorage::new());
        browser.dispatch(Command::NewTab);
        browser.dispatch(Command::ToggleIncognito);
        browser.adapter_mut().take_calls();

        browser.dispatch(Command::DeleteCookies);
        browser.dispatch(Command::SelectTab(0));
        browser.dispatch(Command::DeleteCookies);

        let calls = browser.adapter_mut().take_calls();
        assert_eq!(calls[0], Call::DeleteCookies(ProfileKind::Incognito, vec![id_at(&browser, 2)]));
        assert_eq!(
            calls[2],
            Call::DeleteCookies(ProfileKind::Persistent, vec![id_at(&browser, 0), id_at(&browser, 1)])
        );
    }

    #[test]
    fn test_command_wire_format() {
        let command: Command = serde_json::from_str(r#"{"type": "select_search_engine", "value": "Brave"}"#).unwrap();
        assert_eq!(command, Command::SelectSearchEngine(SearchEngine::Brave));

        let command: Command = serde_json::from_str(r#"{"type": "set_theme", "value": "red"}"#).unwrap();
        assert_eq!(command, Command::SetTheme(Theme::Red));

        let command: Command = serde_json::from_str(r#"{"type": "back"}"#).unwrap();
        assert_eq!(command, Command::Back);

        assert!(serde_json::from_str::<Command>(r#"{"type": "select_search_engine", "value": "Yahoo"}"#).is_err());
    }

    #[test]
    fn test_snapshot_serialises_for_toolbar() {
        let (browser, _tx) = started_browser(MemoryStorage::new());
        let json = serde_json::to_value(browser.snapshot()).unwrap();

        assert_eq!(json["windowStyle"], "background-color: white;");
        assert_eq!(json["activeIndex"], 0);
        assert_eq!(json["addressCursor"], 0);
        assert_eq!(json["tabs"][0]["label"], "New Tab");
        assert_eq!(json["searchEngine"], "Google");
    }

    #[test]
    fn test_snapshot_carries_tab_styles() {
        let (mut browser, _tx) = started_browser(MemoryStorage::new());
        browser.dispatch(Command::SetTheme(Theme::Red));
        browser.dispatch(Command::SetIncognitoColor(Theme::Blue));
        browser.dispatch(Command::ToggleIncognito);

        let snapshot = browser.snapshot();
        assert_eq!(snapshot.window_style, Theme::Red.style().css());
        assert_eq!(snapshot.tabs[0].style, Theme::Red.style().css());
        assert!(snapshot.tabs[1].incognito);
        assert_eq!(snapshot.tabs[1].style, Theme::Blue.incognito_style().css());
    }

    #[rstest]
    #[case("search:DuckDuckGo", Some(Command::SelectSearchEngine(SearchEngine::DuckDuckGo)))]
    #[case("theme:orange", Some(Command::SetTheme(Theme::Orange)))]
    #[case("incognito:blue", Some(Command::SetIncognitoColor(Theme::Blue)))]
    #[case("cookies:delete", Some(Command::DeleteCookies))]
    #[case("search:Yahoo", None)]
    #[case("theme", None)]
    #[case("print:now", None)]
    fn test_menu_ids(#[case] id: &str, #[case] expected: Option<Command>) {
        assert_eq!(Command::from_menu_id(id), expected);
    }

    #[test]
    fn test_every_menu_item_maps_to_a_command() {
        let (browser, _tx) = started_browser(MemoryStorage::new());
        for kind in [MenuKind::SearchEngine, MenuKind::Theme, MenuKind::Cookies] {
            for entry in browser.menu(kind).into_iter().flatten() {
                assert!(Command::from_menu_id(&entry.id).is_some(), "{}", entry.id);
            }
        }

        let sections = browser.menu(MenuKind::Theme);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0][0].label, "white ✅");
        assert_eq!(sections[1][1].label, "Incognito: gray ✅");
    }
}
