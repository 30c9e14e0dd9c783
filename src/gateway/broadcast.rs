//! Fan-out of envelopes to connected WebSocket clients.

use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};
use uuid::Uuid;
use wabridge_core::message::Envelope;

/// Set of open client connections, keyed by connection id. Each entry is
/// the bounded outbound queue drained by that connection's writer task.
#[derive(Default)]
pub struct Broadcaster {
    clients: HashMap<Uuid, mpsc::Sender<String>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: Uuid, tx: mpsc::Sender<String>) {
        self.clients.insert(id, tx);
    }

    pub fn remove(&mut self, id: &Uuid) {
        self.clients.remove(id);
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Serialize once and queue to every open connection. Returns how many
    /// connections accepted the frame.
    pub fn broadcast(&self, envelope: &Envelope) -> usize {
        if self.is_empty() {
            debug!("no clients connected, {} envelope not sent", envelope.kind());
            return 0;
        }
        let json = match serde_json::to_string(envelope) {
            Ok(j) => j,
            Err(e) => {
                error!("failed to serialize {} envelope: {e}", envelope.kind());
                return 0;
            }
        };

        let mut delivered = 0;
        for (id, tx) in &self.clients {
            if deliver(id, tx, json.clone()) {
                delivered += 1;
            }
        }
        debug!(
            "broadcast {} to {delivered}/{} clients",
            envelope.kind(),
            self.clients.len()
        );
        delivered
    }

    /// Queue an envelope to a single connection.
    pub fn send_to(&self, id: &Uuid, envelope: &Envelope) -> bool {
        let Some(tx) = self.clients.get(id) else {
            debug!("client {id} is gone, dropping {} envelope", envelope.kind());
            return false;
        };
        match serde_json::to_string(envelope) {
            Ok(json) => deliver(id, tx, json),
            Err(e) => {
                error!("failed to serialize {} envelope: {e}", envelope.kind());
                false
            }
        }
    }
}

fn deliver(id: &Uuid, tx: &mpsc::Sender<String>, json: String) -> bool {
    if tx.is_closed() {
        return false;
    }
    match tx.try_send(json) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!("client {id} is not keeping up, frame dropped");
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}
