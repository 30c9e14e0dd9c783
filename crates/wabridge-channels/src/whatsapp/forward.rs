//! Hand-off of translated events from the library's callbacks to the gateway.
//!
//! The library runs every event callback in its own task, so events reach the
//! gateway queue complete but not necessarily in emission order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use wabridge_core::event::SessionEvent;

/// Forwards events for one bot. Once a newer bot is built, this one's
/// events are dropped.
#[derive(Clone)]
pub(super) struct EventForwarder {
    events: mpsc::Sender<SessionEvent>,
    generation: Arc<AtomicU64>,
    mine: u64,
}

impl EventForwarder {
    /// Claim the next generation, retiring every earlier forwarder.
    pub(super) fn new(events: mpsc::Sender<SessionEvent>, generation: &Arc<AtomicU64>) -> Self {
        let mine = generation.fetch_add(1, Ordering::SeqCst) + 1;
        Self {
            events,
            generation: generation.clone(),
            mine,
        }
    }

    pub(super) fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.mine
    }

    pub(super) async fn forward(&self, event: SessionEvent) {
        if !self.is_current() {
            debug!("dropping event from replaced WhatsApp bot");
            return;
        }
        if self.events.send(event).await.is_err() {
            debug!("session event receiver dropped");
        }
    }
}
