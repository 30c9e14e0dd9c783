//! Outbound half of the connector: sending through a live client.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use wabridge_core::{error::BridgeError, traits::WhatsAppClient};
use wacore_binary::jid::Jid;
use whatsapp_rust::client::Client;

/// A live `whatsapp-rust` client.
pub struct WhatsAppHandle {
    client: Arc<Client>,
}

impl WhatsAppHandle {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

/// Parse a chat id such as `5511999887766@s.whatsapp.net`.
pub(super) fn parse_jid(chat_id: &str) -> Result<Jid, BridgeError> {
    chat_id
        .parse()
        .map_err(|e| BridgeError::Client(format!("invalid whatsapp JID '{chat_id}': {e}")))
}

/// Build a plain text message body.
pub(super) fn text_message(text: &str) -> waproto::whatsapp::Message {
    waproto::whatsapp::Message {
        conversation: Some(text.to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl WhatsAppClient for WhatsAppHandle {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<String, BridgeError> {
        let jid = parse_jid(chat_id)?;
        let msg_id = self
            .client
            .send_message(jid, text_message(text))
            .await
            .map_err(|e| BridgeError::Client(format!("whatsapp send failed: {e}")))?;
        debug!("whatsapp message {msg_id} sent to {chat_id}");
        Ok(msg_id)
    }
}
