//! Session orchestrator: owns the external client handle and applies the
//! reconnect policy.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use wabridge_core::{
    error::BridgeError,
    event::{ConnectionState, ConnectionUpdate, SessionEvent},
    message::Envelope,
    traits::{Connector, WhatsAppClient},
};

pub(super) const QR_STATUS: &str = "QR Code Received. Scan please!";
pub(super) const CONNECTED_STATUS: &str = "WhatsApp Connected!";

/// Lifecycle of the WhatsApp session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    AwaitingPairing,
    Connected,
}

pub struct Session {
    connector: Arc<dyn Connector>,
    events: mpsc::Sender<SessionEvent>,
    client: Option<Arc<dyn WhatsAppClient>>,
    state: SessionState,
}

impl Session {
    pub fn new(connector: Arc<dyn Connector>, events: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            connector,
            events,
            client: None,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Initialize the external client. Blocks until it is ready or fails.
    pub async fn start(&mut self) -> Result<(), BridgeError> {
        info!("starting {} session", self.connector.name());
        let client = self.connector.connect(self.events.clone()).await?;
        self.client = Some(client);
        self.state = SessionState::AwaitingPairing;
        Ok(())
    }

    /// Apply a connection update and return the envelopes to broadcast.
    pub async fn on_connection_update(&mut self, update: ConnectionUpdate) -> Vec<Envelope> {
        let mut out = Vec::new();

        if let Some(qr) = update.qr {
            info!("pairing code received");
            out.push(Envelope::Qr { data: qr });
            out.push(Envelope::status(QR_STATUS));
        }

        match update.connection {
            Some(ConnectionState::Open) => {
                info!("WhatsApp connection open");
                self.state = SessionState::Connected;
                out.push(Envelope::status(CONNECTED_STATUS));
            }
            Some(ConnectionState::Close) => {
                let reason = update
                    .last_disconnect
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "Unknown Reason".to_string());
                let logged_out = update
                    .last_disconnect
                    .as_ref()
                    .is_some_and(|r| r.is_logged_out());
                let reconnect = !logged_out;

                warn!("connection closed due to {reason}, reconnecting: {reconnect}");
                out.push(Envelope::status(format!(
                    "Connection Closed: {reason}. Reconnecting: {reconnect}"
                )));

                if reconnect {
                    if let Err(e) = self.start().await {
                        error!("reconnect failed: {e}");
                        self.client = None;
                        self.state = SessionState::Disconnected;
                        out.push(Envelope::status(format!("Reconnect failed: {e}")));
                    }
                } else {
                    self.client = None;
                    self.state = SessionState::Disconnected;
                }
            }
            Some(ConnectionState::Connecting) | None => {}
        }

        out
    }

    /// Send a text message through the active client.
    pub async fn send_message(&self, chat_id: &str, content: &str) -> Result<String, BridgeError> {
        let Some(client) = &self.client else {
            error!("cannot send message: WhatsApp client is not initialized");
            return Err(BridgeError::NotConnected);
        };
        if chat_id.is_empty() || content.is_empty() {
            error!("cannot send message: invalid chatId or content");
            return Err(BridgeError::InvalidArguments);
        }

        info!("sending message to {chat_id}");
        let id = client.send_text(chat_id, content).await?;
        info!("message {id} sent to {chat_id}");
        Ok(id)
    }
}
