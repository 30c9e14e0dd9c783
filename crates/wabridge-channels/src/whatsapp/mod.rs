//! WhatsApp connector backed by `whatsapp-rust`.
//!
//! Uses the WhatsApp Web protocol (Noise handshake + Signal encryption).
//! Pairing is done by scanning a QR code, like WhatsApp Web.
//! Session is persisted to `{data_dir}/whatsapp_session/whatsapp.db`.

mod bot;
mod client;
mod events;
mod forward;
mod qr;
mod running;


pub use client::WhatsAppHandle;
pub use qr::generate_qr_terminal;

use async_trait::async_trait;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use wabridge_core::{
    config::{shellexpand, WhatsAppConfig},
    error::BridgeError,
    event::SessionEvent,
    traits::{Connector, WhatsAppClient},
};

/// Builds and runs `whatsapp-rust` bots on demand.
pub struct WhatsAppConnector {
    pub(super) config: WhatsAppConfig,
    pub(super) data_dir: String,
    /// The running bot. Shut down and replaced on every connect.
    pub(super) running: Mutex<Option<running::RunningBot>>,
    /// Bumped per connect; events from older bots are discarded.
    pub(super) generation: Arc<AtomicU64>,
}

impl WhatsAppConnector {
    /// Create a new connector from config.
    pub fn new(config: WhatsAppConfig, data_dir: &str) -> Self {
        Self {
            config,
            data_dir: data_dir.to_string(),
            running: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get the session database path, creating its directory.
    pub(super) fn session_db_path(&self) -> String {
        let session_dir = session_dir(&self.data_dir);
        let _ = std::fs::create_dir_all(&session_dir);
        format!("{session_dir}/whatsapp.db")
    }
}

/// Directory holding the client's session store.
pub fn session_dir(data_dir: &str) -> String {
    format!("{}/whatsapp_session", shellexpand(data_dir))
}

/// Whether a previous pairing left a session database behind.
pub fn has_session(data_dir: &str) -> bool {
    std::path::Path::new(&format!("{}/whatsapp.db", session_dir(data_dir))).exists()
}

#[async_trait]
impl Connector for WhatsAppConnector {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn connect(
        &self,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn WhatsAppClient>, BridgeError> {
        let client = self.build_and_run_bot(events).await?;
        Ok(Arc::new(WhatsAppHandle::new(client)))
    }
}
