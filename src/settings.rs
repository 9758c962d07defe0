use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use crate::theme::Theme;

pub const SETTINGS_FILE: &str = "lumen_config.json";

/// Substitution point inside a search engine's query template.
pub const QUERY_PLACEHOLDER: &str = "{}";

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown preference: {0}")]
    UnknownKey(String),

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: PreferenceKey, value: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown search engine: {0}")]
pub struct UnknownSearchEngine(pub String);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum SearchEngine {
    #[default]
    Google,
    Bing,
    DuckDuckGo,
    Brave,
}

impl SearchEngine {
    /// Catalog order, which is also the order of the search menu.
    pub const ALL: [SearchEngine; 4] = [
        Self::Google,
        Self::Bing,
        Self::DuckDuckGo,
        Self::Brave,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Bing => "Bing",
            Self::DuckDuckGo => "DuckDuckGo",
            Self::Brave => "Brave",
        }
    }

    pub fn home_url(&self) -> &'static str {
        match self {
            Self::Google => "https://www.google.com/ncr",
            Self::Bing => "https://www.bing.com/?cc=us",
            Self::DuckDuckGo => "https://duckduckgo.com/?kl=us-en",
            Self::Brave => "https://search.brave.com",
        }
    }

    pub fn query_template(&self) -> &'static str {
        match self {
            Self::Google => "https://www.google.com/ncr/search?q={}",
            Self::Bing => "https://www.bing.com/?cc=us&q={}",
            Self::DuckDuckGo => "https://duckduckgo.com/?kl=us-en&q={}",
            Self::Brave => "https://search.brave.com/search?q={}",
        }
    }

    /// The query is substituted verbatim. Encoding is left to the engine,
    /// which normalises the URL when it loads it.
    pub fn query_url(&self, query: &str) -> String {
        self.query_template().replacen(QUERY_PLACEHOLDER, query, 1)
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchEngine {
    type Err = UnknownSearchEngine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|engine| engine.name() == s)
            .ok_or_else(|| UnknownSearchEngine(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceKey {
    Theme,
    SearchEngine,
    IncognitoColor,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 3] = [Self::Theme, Self::SearchEngine, Self::IncognitoColor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Theme => "theme",
            Self::SearchEngine => "search_engine",
            Self::IncognitoColor => "incognito_color",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKey {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| PreferenceError::UnknownKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
    pub search_engine: SearchEngine,
    pub incognito_color: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::White,
            search_engine: SearchEngine::Google,
            incognito_color: Theme::Gray,
        }
    }
}

impl Preferences {
    /// Parses a persisted document. Keys that are missing or carry an
    /// unrecognised value fall back to their default individually; only a
    /// document that is not a JSON object is an error.
    pub fn from_json(content: &str) -> Result<Self, PreferenceError> {
        let doc: Map<String, Value> = serde_json::from_str(content)?;
        let defaults = Self::default();

        Ok(Self {
            theme: field(&doc, PreferenceKey::Theme).unwrap_or(defaults.theme),
            search_engine: field(&doc, PreferenceKey::SearchEngine)
                .unwrap_or(defaults.search_engine),
            incognito_color: field(&doc, PreferenceKey::IncognitoColor)
                .unwrap_or(defaults.incognito_color),
        })
    }

    pub fn to_json(&self) -> Result<String, PreferenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn field<T: FromStr>(doc: &Map<String, Value>, key: PreferenceKey) -> Option<T> {
    let raw = doc.get(key.as_str())?;
    let parsed = raw.as_str().and_then(|s| s.parse().ok());
    if parsed.is_none() {
        log::warn!("[Settings] Ignoring invalid {} value {}, using default", key, raw);
    }
    parsed
}

/// Where the preference document lives. Injected into the store so the
/// backing medium can be swapped (file on disk, memory in tests).
pub trait PreferenceStorage: Send {
    /// `Ok(None)` when nothing has been persisted yet.
    fn read(&self) -> Result<Option<String>, PreferenceError>;
    fn write(&self, contents: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, PreferenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }

    fn write(&self, contents: &str) -> Result<(), PreferenceError> {
        let tmp_path = self.path.with_extension("tmp");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to tmp, then rename, so a crash never leaves a half-written file.
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, &self.path)?;

        Ok(())
    }
}

/// In-memory storage. Clones share the same document, so a second store
/// built from a clone sees what the first one saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    contents: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: Arc::new(Mutex::new(Some(contents.to_string()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl PreferenceStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, PreferenceError> {
        let contents = self
            .contents
            .lock()
            .map_err(|e| PreferenceError::Storage(e.to_string()))?;
        Ok(contents.clone())
    }

    fn write(&self, contents: &str) -> Result<(), PreferenceError> {
        let mut slot = self
            .contents
            .lock()
            .map_err(|e| PreferenceError::Storage(e.to_string()))?;
        *slot = Some(contents.to_string());
        Ok(())
    }
}

pub struct PreferenceStore {
    prefs: Preferences,
    storage: Box<dyn PreferenceStorage>,
}

impl PreferenceStore {
    /// Builds the store and loads whatever the storage holds.
    pub fn new(storage: Box<dyn PreferenceStorage>) -> Self {
        let mut store = Self {
            prefs: Preferences::default(),
            storage,
        };
        store.load();
        store
    }

    /// Reloads from storage. Read or parse failures keep the defaults.
    pub fn load(&mut self) {
        self.prefs = match self.storage.read() {
            Ok(Some(content)) => Preferences::from_json(&content).unwrap_or_else(|e| {
                log::warn!("[Settings] Failed to parse settings: {}, returning defaults", e);
                Preferences::default()
            }),
            Ok(None) => Preferences::default(),
            Err(e) => {
                log::warn!("[Settings] Failed to read settings: {}, returning defaults", e);
                Preferences::default()
            }
        };
    }

    /// Persists the whole set. Failures are logged and dropped: the worst
    /// outcome is that the next start sees stale preferences.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            log::error!("[Settings] Failed to save settings: {}", e);
        }
    }

    pub fn try_save(&self) -> Result<(), PreferenceError> {
        let json = self.prefs.to_json()?;
        self.storage.write(&json)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn get(&self, key: PreferenceKey) -> &'static str {
        match key {
            PreferenceKey::Theme => self.prefs.theme.id(),
            PreferenceKey::SearchEngine => self.prefs.search_engine.name(),
            PreferenceKey::IncognitoColor => self.prefs.incognito_color.id(),
        }
    }

    pub fn set(&mut self, key: PreferenceKey, value: &str) -> Result<(), PreferenceError> {
        let invalid = || PreferenceError::InvalidValue {
            key,
            value: value.to_string(),
        };
        match key {
            PreferenceKey::Theme => self.set_theme(value.parse().map_err(|_| invalid())?),
            PreferenceKey::SearchEngine => {
                self.set_search_engine(value.parse().map_err(|_| invalid())?)
            }
            PreferenceKey::IncognitoColor => {
                self.set_incognito_color(value.parse().map_err(|_| invalid())?)
            }
        }
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        self.prefs.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.prefs.theme = theme;
        self.save();
    }

    pub fn search_engine(&self) -> SearchEngine {
        self.prefs.search_engine
    }

    pub fn set_search_engine(&mut self, engine: SearchEngine) {
        self.prefs.search_engine = engine;
        self.save();
    }

    pub fn incognito_color(&self) -> Theme {
        self.prefs.incognito_color
    }

    pub fn set_incognito_color(&mut self, color: Theme) {
        self.prefs.incognito_color = color;
        self.save();
    }
}
