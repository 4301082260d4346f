use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] WebSocketError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// Listener bind and server run failures
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

/// Failures scoped to a single connection. Only `InvalidFormat` is
/// recoverable; everything else ends the connection.
#[derive(Error, Debug)]
pub enum WebSocketError {
    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Message sending failed: {0}")]
    SendError(String),

    #[error("Receive failed: {0}")]
    ReceiveError(String),

    #[error("Deadline exceeded: {0}")]
    Timeout(String),

    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Connection closed")]
    Closed,
}

impl WebSocketError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WebSocketError::InvalidFormat(_))
    }
}

impl From<serde_json::Error> for WebSocketError {
    fn from(err: serde_json::Error) -> Self {
        WebSocketError::InvalidFormat(err.to_string())
    }
}
