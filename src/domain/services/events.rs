use tokio::sync::mpsc;

use crate::domain::models::DisplayEvent;

/// Sending half of the display channel. Emitting never fails a turn, events
/// are dropped once the renderer is gone.
#[derive(Clone)]
pub struct EventEmitter {
    tx: mpsc::UnboundedSender<DisplayEvent>,
}

impl EventEmitter {
    pub fn new(tx: mpsc::UnboundedSender<DisplayEvent>) -> EventEmitter {
        return EventEmitter { tx };
    }

    pub fn emit(&self, event: DisplayEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::debug!(event = ?err.0, "Renderer is gone, dropping display event");
        }
    }
}
