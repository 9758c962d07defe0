// Seam between the browser controller and the embedded rendering engine.

use url::Url;

use crate::modules::profiles::{BrowsingProfile, ProfileKind};
use crate::state::{Tab, TabId};
use crate::theme::StyleTarget;

/// Operations the controller needs from the rendering engine. All calls are
/// fire-and-forget; the engine reports progress back through
/// [`crate::modules::events`].
pub trait EngineAdapter: StyleTarget {
    /// Creates the view for a new tab and starts loading `tab.url`.
    fn open_tab(&mut self, tab: &Tab, profile: &BrowsingProfile);
    fn close_tab(&mut self, tab: TabId);
    /// Shows `tab` and hides every other tab view.
    fn activate_tab(&mut self, tab: TabId);
    fn load_url(&mut self, tab: TabId, url: &str);
    fn go_back(&mut self, tab: TabId);
    fn go_forward(&mut self, tab: TabId);
    fn reload(&mut self, tab: TabId);
    /// Clears the cookie store of `profile`. `tabs` are the open tabs bound to it.
    fn delete_all_cookies(&mut self, profile: ProfileKind, tabs: &[TabId]);
}

const WEB_SCHEMES: [&str; 5] = ["http", "https", "file", "about", "data"];

/// Turns an address the user typed into something a webview accepts.
///
/// The text is tried as-is first and kept only when it names a web scheme;
/// bare hosts like `example.com` or `example.com:8080` get an `http://`
/// prefix the way engines fix up user input. `None` when neither form parses.
pub fn engine_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if let Ok(u) = Url::parse(trimmed) {
        // "example.com:8080" parses with scheme "example.com"
        if WEB_SCHEMES.contains(&u.scheme()) {
            return Some(u);
        }
    }
    match Url::parse(&format!("http://{}", trimmed)) {
        Ok(u) if u.host().is_some() => Some(u),
        _ => {
            log::warn!("[Engine] Cannot turn {:?} into a URL", raw);
            None
        }
    }
}
