// Engine notifications travel over an unbounded channel from the webview
// callbacks to the browser controller. Sending never blocks, so a callback
// that fires while the controller is busy just queues its event.

use tokio::sync::mpsc;

use crate::state::TabId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    UrlChanged { tab: TabId, url: String },
    LoadStarted { tab: TabId },
    LoadFinished { tab: TabId, title: Option<String> },
}

impl EngineEvent {
    pub fn tab(&self) -> TabId {
        match self {
            Self::UrlChanged { tab, .. }
            | Self::LoadStarted { tab }
            | Self::LoadFinished { tab, .. } => *tab,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineEventSender(mpsc::UnboundedSender<EngineEvent>);

impl EngineEventSender {
    pub fn send(&self, event: EngineEvent) {
        if let Err(e) = self.0.send(event) {
            log::debug!("[Events] Dropping event, controller is gone: {:?}", e.0);
        }
    }
}

#[derive(Debug)]
pub struct EngineEventReceiver(mpsc::UnboundedReceiver<EngineEvent>);

impl EngineEventReceiver {
    /// Takes everything queued so far without waiting.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.0.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn channel() -> (EngineEventSender, EngineEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EngineEventSender(tx), EngineEventReceiver(rx))
}
