use crate::{error::BridgeError, event::SessionEvent};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Handle to a live external WhatsApp client, the outbound half.
///
/// Obtained from [`Connector::connect`]. Dropping the last handle does not
/// tear the session down; the connector owns the background task.
#[async_trait]
pub trait WhatsAppClient: Send + Sync {
    /// Send a plain text message to a chat. Returns the message id
    /// assigned by the client.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<String, BridgeError>;
}

/// Factory for external WhatsApp client sessions, the inbound half.
///
/// Every call initializes a fresh session that reports through `events`.
/// Calling it again (reconnect) replaces the previous session.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Human-readable connector name.
    fn name(&self) -> &str;

    /// Initialize the external client and start emitting session events.
    async fn connect(
        &self,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn WhatsAppClient>, BridgeError>;
}
