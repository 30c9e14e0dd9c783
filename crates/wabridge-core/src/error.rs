use thiserror::Error;

/// Top-level error type for the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No external client handle is active.
    #[error("WhatsApp not connected")]
    NotConnected,

    /// A send was requested with an empty chat id or content.
    #[error("Invalid chatId or content")]
    InvalidArguments,

    /// Error reported by the external WhatsApp client.
    #[error("client error: {0}")]
    Client(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
