// Tauri shell: the main window's own webview renders the toolbar, and every
// tab is a child webview placed underneath it.

use tauri::menu::{MenuBuilder, MenuItemBuilder, PredefinedMenuItem};
use tauri::webview::PageLoadEvent;
use tauri::{
    AppHandle, Emitter, Manager, PhysicalPosition, PhysicalSize, State, Webview, WebviewBuilder,
    WebviewUrl, Window,
};

use crate::browser::{Browser, ChromeSnapshot, Command, MenuKind};
use crate::modules::engine::{engine_url, EngineAdapter};
use crate::modules::events::{self, EngineEvent, EngineEventSender};
use crate::modules::profiles::{BrowsingProfile, ProfileKind};
use crate::settings::{FileStorage, PreferenceStore};
use crate::state::{AppState, Tab, TabId};
use crate::theme::{Style, StyleTarget};

/// Toolbar plus tab strip, in logical pixels.
const TOOLBAR_HEIGHT: f64 = 56.0 + 28.0;
const MIN_CONTENT_HEIGHT: u32 = 100;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

const MAIN_WINDOW: &str = "main";
const STATE_EVENT: &str = "browser-state";
const WINDOW_STYLE_EVENT: &str = "window-style";
const TAB_LABEL_PREFIX: &str = "tab-";

// Only reaches cookies visible to scripts; HttpOnly cookies stay with the engine.
const CLEAR_COOKIES_JS: &str = r#"
    document.cookie.split(";").forEach(function(c) {
        document.cookie = c.replace(/^ +/, "").replace(/=.*/, "=;expires=" + new Date().toUTCString() + ";path=/");
    });
"#;

pub struct TauriAdapter {
    app: AppHandle,
    window: Window,
    events: EngineEventSender,
}

impl TauriAdapter {
    pub fn new(app: AppHandle, window: Window, events: EngineEventSender) -> Self {
        Self { app, window, events }
    }

    fn webview(&self, tab: TabId) -> Option<Webview> {
        let webview = self.app.get_webview(&tab.webview_label());
        if webview.is_none() {
            log::warn!("[Shell] No webview for {}", tab);
        }
        webview
    }

    fn eval(&self, tab: TabId, js: &str) {
        if let Some(webview) = self.webview(tab) {
            if let Err(e) = webview.eval(js) {
                log::warn!("[Shell] Script failed in {}: {}", tab, e);
            }
        }
    }
}

impl StyleTarget for TauriAdapter {
    fn set_window_style(&mut self, style: &Style) {
        if let Err(e) = self.app.emit_to(MAIN_WINDOW, WINDOW_STYLE_EVENT, style.css()) {
            log::warn!("[Shell] Failed to emit window style: {}", e);
        }
    }

    fn set_tab_style(&mut self, tab: TabId, style: &Style) {
        // The tab strip lives in the toolbar webview and draws tab colours
        // from `Browser::snapshot`; tab webviews keep the page's own colours.
        log::trace!("[Shell] {} styled {}", tab, style.css());
    }
}

impl EngineAdapter for TauriAdapter {
    fn open_tab(&mut self, tab: &Tab, profile: &BrowsingProfile) {
        let Some(url) = engine_url(&tab.url) else {
            return;
        };
        let id = tab.id;
        let events = self.events.clone();
        let app = self.app.clone();

        let builder = WebviewBuilder::new(id.webview_label(), WebviewUrl::External(url))
            .user_agent(USER_AGENT)
            .incognito(profile.is_ephemeral())
            .on_page_load(move |_webview, payload| {
                let url = payload.url().to_string();
                events.send(EngineEvent::UrlChanged { tab: id, url });
                if matches!(payload.event(), PageLoadEvent::Finished) {
                    // The webview API exposes no document title; the host stands in.
                    let title = payload.url().host_str().map(str::to_string);
                    events.send(EngineEvent::LoadFinished { tab: id, title });
                } else {
                    events.send(EngineEvent::LoadStarted { tab: id });
                }
                pump(&app);
            });

        let result = self.window.inner_size().and_then(|size| {
            let scale = self.window.scale_factor()?;
            let (position, size) = content_bounds(size, scale);
            self.window.add_child(builder, position, size)
        });
        match result {
            Ok(_) => log::info!("[Shell] Opened {} ({:?} profile)", id, profile.kind),
            Err(e) => log::error!("[Shell] Failed to create webview for {}: {}", id, e),
        }
    }

    fn close_tab(&mut self, tab: TabId) {
        if let Some(webview) = self.webview(tab) {
            if let Err(e) = webview.close() {
                log::warn!("[Shell] Failed to close {}: {}", tab, e);
            }
        }
    }

    fn activate_tab(&mut self, tab: TabId) {
        let target = tab.webview_label();
        for (label, webview) in self.app.webviews() {
            if !label.starts_with(TAB_LABEL_PREFIX) {
                continue;
            }
            let result = if label == target { webview.show() } else { webview.hide() };
            if let Err(e) = result {
                log::warn!("[Shell] Failed to toggle {}: {}", label, e);
            }
        }
    }

    fn load_url(&mut self, tab: TabId, url: &str) {
        let Some(url) = engine_url(url) else {
            return;
        };
        if let Some(webview) = self.webview(tab) {
            if let Err(e) = webview.navigate(url) {
                log::warn!("[Shell] Navigation failed in {}: {}", tab, e);
            }
        }
    }

    fn go_back(&mut self, tab: TabId) {
        self.eval(tab, "window.history.back()");
    }

    fn go_forward(&mut self, tab: TabId) {
        self.eval(tab, "window.history.forward()");
    }

    fn reload(&mut self, tab: TabId) {
        self.eval(tab, "window.location.reload()");
    }

    fn delete_all_cookies(&mut self, profile: ProfileKind, tabs: &[TabId]) {
        log::info!("[Shell] Clearing {:?} cookies in {} tab(s)", profile, tabs.len());
        for tab in tabs {
            self.eval(*tab, CLEAR_COOKIES_JS);
        }
    }
}

/// Area below the toolbar for a window of `size` physical pixels.
fn content_bounds(size: PhysicalSize<u32>, scale: f64) -> (PhysicalPosition<i32>, PhysicalSize<u32>) {
    let toolbar = (TOOLBAR_HEIGHT * scale) as u32;
    let height = size.height.saturating_sub(toolbar).max(MIN_CONTENT_HEIGHT);
    (
        PhysicalPosition::new(0, toolbar as i32),
        PhysicalSize::new(size.width, height),
    )
}

fn relayout(app: &AppHandle, size: PhysicalSize<u32>, scale: f64) {
    let (position, size) = content_bounds(size, scale);
    for (label, webview) in app.webviews() {
        if !label.starts_with(TAB_LABEL_PREFIX) {
            continue;
        }
        let bounds = tauri::Rect {
            position: tauri::Position::Physical(position),
            size: tauri::Size::Physical(size),
        };
        if let Err(e) = webview.set_bounds(bounds) {
            log::warn!("[Shell] Failed to resize {}: {}", label, e);
        }
    }
}

fn emit_snapshot(app: &AppHandle, browser: &Browser<TauriAdapter>) {
    if let Err(e) = app.emit_to(MAIN_WINDOW, STATE_EVENT, browser.snapshot()) {
        log::warn!("[Shell] Failed to emit browser state: {}", e);
    }
}

/// Folds queued engine events into the browser. When a command currently
/// holds the lock, the events stay queued and that command drains them.
fn pump(app: &AppHandle) {
    let Some(state) = app.try_state::<AppState>() else {
        return;
    };
    let Ok(mut browser) = state.browser.try_lock() else {
        return;
    };
    if browser.pump_events() {
        emit_snapshot(app, &browser);
    }
}

fn run_command(app: &AppHandle, command: Command) -> Result<(), String> {
    let state = app.state::<AppState>();
    let mut browser = state.browser.lock().map_err(|e| e.to_string())?;
    browser.dispatch(command);
    browser.pump_events();
    emit_snapshot(app, &browser);
    Ok(())
}

#[tauri::command]
fn browser_command(app: AppHandle, command: Command) -> Result<(), String> {
    run_command(&app, command)
}

/// Pops up a native menu under the cursor. Item ids are routed back through
/// `Command::from_menu_id` by the menu event handler installed in `setup`.
#[tauri::command]
fn show_menu(app: AppHandle, state: State<AppState>, kind: MenuKind) -> Result<(), String> {
    let sections = {
        let browser = state.browser.lock().map_err(|e| e.to_string())?;
        browser.menu(kind)
    };

    let mut builder = MenuBuilder::new(&app);
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            builder = builder.item(&PredefinedMenuItem::separator(&app).map_err(|e| e.to_string())?);
        }
        for entry in section {
            let item = MenuItemBuilder::with_id(entry.id.as_str(), entry.label.as_str())
                .build(&app)
                .map_err(|e| e.to_string())?;
            builder = builder.item(&item);
        }
    }
    let menu = builder.build().map_err(|e| e.to_string())?;

    let window = app.get_window(MAIN_WINDOW).ok_or("main window is missing")?;
    window.popup_menu(&menu).map_err(|e| e.to_string())
}

#[tauri::command]
fn browser_snapshot(state: State<AppState>) -> Result<ChromeSnapshot, String> {
    let browser = state.browser.lock().map_err(|e| e.to_string())?;
    Ok(browser.snapshot())
}

fn setup(app: &mut tauri::App) -> Result<(), Box<dyn std::error::Error>> {
    let window = app.get_window(MAIN_WINDOW).ok_or("main window is missing")?;
    let data_dir = app.path().app_data_dir()?;

    let prefs = PreferenceStore::new(Box::new(FileStorage::in_dir(&data_dir)));
    let (sender, receiver) = events::channel();
    let adapter = TauriAdapter::new(app.handle().clone(), window.clone(), sender);
    app.manage(AppState::new(Browser::new(prefs, adapter, receiver)));

    {
        let state = app.state::<AppState>();
        let mut browser = state.browser.lock().map_err(|e| e.to_string())?;
        browser.start();
    }

    app.on_menu_event(|app_handle, event| {
        let id = event.id().0.as_str();
        match Command::from_menu_id(id) {
            Some(command) => {
                if let Err(e) = run_command(app_handle, command) {
                    log::error!("[Shell] Menu action {} failed: {}", id, e);
                }
            }
            None => log::warn!("[Shell] Unknown menu item {}", id),
        }
    });

    // Keep tab webviews under the toolbar when the window resizes
    let handle = app.handle().clone();
    let main_window = window.clone();
    window.on_window_event(move |event| {
        if let tauri::WindowEvent::Resized(size) = event {
            let scale = main_window.scale_factor().unwrap_or(1.0);
            relayout(&handle, *size, scale);
        }
    });

    Ok(())
}

pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }
            setup(app)
        })
        .invoke_handler(tauri::generate_handler![browser_command, browser_snapshot, show_menu])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
