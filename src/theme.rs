// Theme table and the applier that pushes styles to the window and tabs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::settings::Preferences;
use crate::state::{Tab, TabId};

#[derive(Debug, thiserror::Error)]
#[error("Unknown theme: {0}")]
pub struct UnknownTheme(pub String);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    White,
    Gray,
    Blue,
    Orange,
    Red,
}

impl Theme {
    pub const ALL: [Theme; 5] = [Self::White, Self::Gray, Self::Blue, Self::Orange, Self::Red];

    pub fn id(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Gray => "gray",
            Self::Blue => "blue",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }

    /// Style used for the window and for normal tabs.
    pub fn style(&self) -> Style {
        match self {
            Self::White => Style::plain("white"),
            Self::Gray => Style::plain("#A9A9A9"),
            Self::Blue => Style::with_text("#1e3c72", "white"),
            Self::Orange => Style::with_text("#ff8c00", "black"),
            Self::Red => Style::with_text("#B22222", "white"),
        }
    }

    /// Accent used for incognito tabs. Only sets the background, and gray is
    /// lighter than the gray theme so incognito tabs stand out from it.
    pub fn incognito_style(&self) -> Style {
        match self {
            Self::White => Style::plain("white"),
            Self::Gray => Style::plain("#D3D3D3"),
            Self::Blue => Style::plain("#1e3c72"),
            Self::Orange => Style::plain("#ff8c00"),
            Self::Red => Style::plain("#B22222"),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.id() == s)
            .ok_or_else(|| UnknownTheme(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Style {
    pub background: &'static str,
    pub foreground: Option<&'static str>,
}

impl Style {
    const fn plain(background: &'static str) -> Self {
        Self { background, foreground: None }
    }

    const fn with_text(background: &'static str, foreground: &'static str) -> Self {
        Self { background, foreground: Some(foreground) }
    }

    pub fn css(&self) -> String {
        match self.foreground {
            Some(fg) => format!("background-color: {}; color: {};", self.background, fg),
            None => format!("background-color: {};", self.background),
        }
    }
}

/// Anything that can display the browser's styles.
pub trait StyleTarget {
    fn set_window_style(&mut self, style: &Style);
    fn set_tab_style(&mut self, tab: TabId, style: &Style);
}

pub fn window_style(prefs: &Preferences) -> Style {
    prefs.theme.style()
}

/// Incognito tabs never take the main theme.
pub fn tab_style(prefs: &Preferences, tab: &Tab) -> Style {
    if tab.is_incognito {
        prefs.incognito_color.incognito_style()
    } else {
        prefs.theme.style()
    }
}

/// Applies the current preferences to every tab and then to the window.
/// Each call overwrites all styles, so repeated calls are idempotent.
pub fn apply<T: StyleTarget + ?Sized>(prefs: &Preferences, tabs: &[Tab], target: &mut T) {
    for tab in tabs {
        target.set_tab_style(tab.id, &tab_style(prefs, tab));
    }
    target.set_window_style(&window_style(prefs));
}
