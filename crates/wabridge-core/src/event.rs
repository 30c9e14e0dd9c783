//! Session events emitted by the external WhatsApp client.
//!
//! These are the collaborator's events reduced to the fields the bridge
//! reads. Adapters convert library-specific types into this shape so the
//! transformer and gateway never depend on the protocol crates.

use std::fmt;

/// One event from the external client.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Connection state change and/or a fresh pairing code.
    ConnectionUpdate(ConnectionUpdate),
    /// Full snapshot of known chats.
    ChatsSet(Vec<ChatSnapshot>),
    /// New or updated messages.
    MessagesUpsert(Vec<WaMessage>),
    /// Credentials changed. Persistence belongs to the client's own store.
    CredsUpdate,
}

/// Connection-level update. Any combination of fields may be present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionUpdate {
    pub connection: Option<ConnectionState>,
    pub last_disconnect: Option<DisconnectReason>,
    pub qr: Option<String>,
}

impl ConnectionUpdate {
    /// A pairing code was generated.
    pub fn qr(code: impl Into<String>) -> Self {
        Self {
            qr: Some(code.into()),
            ..Default::default()
        }
    }

    /// The connection is open and authenticated.
    pub fn open() -> Self {
        Self {
            connection: Some(ConnectionState::Open),
            ..Default::default()
        }
    }

    /// The connection was closed for `reason`.
    pub fn closed(reason: DisconnectReason) -> Self {
        Self {
            connection: Some(ConnectionState::Close),
            last_disconnect: Some(reason),
            qr: None,
        }
    }
}

/// Transport state reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Close,
}

/// Why the client connection closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The device was unlinked. Only re-pairing recovers from this.
    LoggedOut,
    /// Socket dropped or keepalive failed.
    ConnectionLost,
    /// Another client took over the session.
    StreamReplaced,
    /// The server rejected the connection.
    ConnectFailure(String),
    Other(String),
}

impl DisconnectReason {
    pub fn is_logged_out(&self) -> bool {
        matches!(self, Self::LoggedOut)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedOut => f.write_str("Logged Out"),
            Self::ConnectionLost => f.write_str("Connection Lost"),
            Self::StreamReplaced => f.write_str("Stream Replaced"),
            Self::ConnectFailure(detail) => write!(f, "Connect Failure ({detail})"),
            Self::Other(detail) => f.write_str(detail),
        }
    }
}

/// A chat as carried by a snapshot event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSnapshot {
    pub id: String,
    /// Explicit chat name, when the client knows one.
    pub name: Option<String>,
    /// Messages in the order the client holds them.
    pub messages: Vec<WaMessage>,
}

/// A single message as emitted by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaMessage {
    pub key: MessageKey,
    pub message: Option<MessagePayload>,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub user_receipt: Vec<UserReceipt>,
}

impl WaMessage {
    /// Whether any recipient has a read receipt recorded.
    pub fn has_read_receipt(&self) -> bool {
        self.user_receipt
            .iter()
            .any(|r| r.read_timestamp.is_some())
    }
}

/// Addressing of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageKey {
    /// Chat JID the message belongs to.
    pub remote_jid: String,
    pub from_me: bool,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserReceipt {
    pub user_jid: String,
    pub read_timestamp: Option<i64>,
}

/// Message body. Several shapes may be present at once; consumers decide
/// which one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePayload {
    pub conversation: Option<String>,
    pub extended_text: Option<String>,
    pub image: Option<ImageInfo>,
    pub document: Option<DocumentInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInfo {
    pub mimetype: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub file_name: Option<String>,
    pub mimetype: Option<String>,
    pub file_length: Option<u64>,
}
