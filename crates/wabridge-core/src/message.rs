//! Wire types exchanged with WebSocket clients.
//!
//! Field names follow the JSON the browser clients already consume
//! (`name`, `username`, `chatId`, `fileName`, ...).

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::{Arc, RwLock};

/// Literal sent in place of a profile for messages sent by the local user.
pub const SELF_SENDER: &str = "You";

/// Display profile for a chat or contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "username")]
    pub handle: String,
    /// `None` when no avatar source is known.
    pub avatar: Option<String>,
    /// `None` when presence is unknown.
    pub online: Option<bool>,
}

/// A cached profile shared by identity. Name corrections made through one
/// handle are seen by every holder.
pub type SharedProfile = Arc<RwLock<UserProfile>>;

fn serialize_profile<S: Serializer>(profile: &SharedProfile, s: S) -> Result<S::Ok, S::Error> {
    let guard = profile
        .read()
        .map_err(|_| S::Error::custom("profile lock poisoned"))?;
    guard.serialize(s)
}

/// Who sent a message.
#[derive(Debug, Clone)]
pub enum MessageSender {
    /// The local user.
    Me,
    Contact(SharedProfile),
}

impl MessageSender {
    pub fn is_me(&self) -> bool {
        matches!(self, Self::Me)
    }

    /// Shared profile of the contact, if the message is not ours.
    pub fn profile(&self) -> Option<&SharedProfile> {
        match self {
            Self::Me => None,
            Self::Contact(p) => Some(p),
        }
    }
}

impl Serialize for MessageSender {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Me => s.serialize_str(SELF_SENDER),
            Self::Contact(profile) => serialize_profile(profile, s),
        }
    }
}

/// Summary of a document attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(rename = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Mimetype subtype, e.g. `pdf` for `application/pdf`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_subtype: Option<String>,
    pub size: String,
}

/// A message reshaped for display.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: String,
    #[serde(rename = "content")]
    pub text_summary: String,
    #[serde(rename = "timestamp")]
    pub formatted_timestamp: String,
    pub unread: bool,
    pub sender: MessageSender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

/// A chat and its messages, as sent in a `full_chats` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub id: String,
    #[serde(serialize_with = "serialize_profile")]
    pub sender: SharedProfile,
    pub messages: Vec<MessageView>,
}

/// A message paired with its chat, as sent in a `new_messages` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    #[serde(rename = "chatId")]
    pub chat_id: String,
    pub message: MessageView,
}

/// Outbound frame broadcast to (or, for errors, sent to one) client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    Qr { data: String },
    Status { data: String },
    FullChats { data: Vec<ChatSummary> },
    NewMessages { data: Vec<NewMessage> },
    Error { message: String },
}

impl Envelope {
    pub fn status(text: impl Into<String>) -> Self {
        Self::Status { data: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Wire name of the envelope type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Qr { .. } => "qr",
            Self::Status { .. } => "status",
            Self::FullChats { .. } => "full_chats",
            Self::NewMessages { .. } => "new_messages",
            Self::Error { .. } => "error",
        }
    }
}

/// Raw inbound frame: `{type, payload}`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundCommand {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Payload of a `send_message` command. Both fields are required for the
/// command to act, but their absence is not a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SendMessagePayload {
    #[serde(rename = "chatId", default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// A recognized client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    SendMessage(SendMessagePayload),
    /// Any other `type`; carries the type for logging.
    Unknown(String),
}

impl InboundCommand {
    /// Parse a raw text frame. Fails only when the frame is not a JSON object.
    pub fn parse(raw: &str) -> Result<ClientCommand, serde_json::Error> {
        let cmd: InboundCommand = serde_json::from_str(raw)?;
        Ok(cmd.into_command())
    }

    pub fn into_command(self) -> ClientCommand {
        match self.kind.as_str() {
            "send_message" => {
                // A payload of the wrong shape counts as missing fields.
                let payload = serde_json::from_value(self.payload).unwrap_or_default();
                ClientCommand::SendMessage(payload)
            }
            _ => ClientCommand::Unknown(self.kind),
        }
    }
}
