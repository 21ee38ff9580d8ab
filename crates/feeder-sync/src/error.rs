//! # Sync Error Types
//!
//! Error types for talking to the feeder.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  InvalidMessage         │ │
//! │  │  InvalidUrl     │  │  Disconnected   │  │  SerializationFailed    │ │
//! │  │  ConfigLoad/Save│  │  NotConnected   │  │  DeserializationFailed  │ │
//! │  └─────────────────┘  │  Timeout        │  └─────────────────────────┘ │
//! │                       └─────────────────┘                              │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │   User Input    │  │    Internal     │                              │
//! │  │                 │  │                 │                              │
//! │  │  Rejected       │  │  ChannelError   │                              │
//! │  │                 │  │  ShuttingDown   │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these stop the client. Transport errors end in a reconnect,
//! protocol errors drop one message, input errors go back to the user.

use feeder_core::ValidationError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Everything that can go wrong between the client and the feeder.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Device URL does not parse or is not ws://.
    #[error("Invalid device URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Failed to establish the WebSocket connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket closed underneath us.
    #[error("Disconnected from feeder")]
    Disconnected,

    /// A command was issued while the device is offline. The command is lost.
    #[error("Device not connected, command dropped")]
    NotConnected,

    /// Connection timeout, in milliseconds.
    #[error("Connection timeout after {0} ms")]
    Timeout(u64),

    /// WebSocket protocol error.
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Inbound text is JSON but not a device message.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Failed to serialize a command.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Failed to parse an inbound message.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    // =========================================================================
    // User Input Errors
    // =========================================================================
    /// Intent rejected before it reached the transport.
    #[error("{0}")]
    Rejected(#[from] ValidationError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Agent is shutting down.
    #[error("Feeder agent is shutting down")]
    ShuttingDown,

    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed => SyncError::Disconnected,
            WsError::AlreadyClosed => SyncError::Disconnected,
            WsError::Protocol(p) => SyncError::WebSocketError(p.to_string()),
            WsError::Io(io) => SyncError::ConnectionFailed(io.to_string()),
            other => SyncError::WebSocketError(other.to_string()),
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the transport recovers from this by reconnecting.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::ConnectionFailed(_)
                | SyncError::Disconnected
                | SyncError::Timeout(_)
                | SyncError::WebSocketError(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if this error came from a malformed message.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidMessage(_)
                | SyncError::SerializationFailed(_)
                | SyncError::DeserializationFailed(_)
        )
    }

    /// Returns true if the user should be told (input rejected).
    pub fn is_user_error(&self) -> bool {
        matches!(self, SyncError::Rejected(_))
    }

    /// Timeout error for an elapsed `limit`.
    pub fn timed_out(limit: std::time::Duration) -> Self {
        SyncError::Timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("refused".into()).is_retryable());
        assert!(SyncError::Disconnected.is_retryable());
        assert!(SyncError::Timeout(10_000).is_retryable());

        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
        assert!(!SyncError::NotConnected.is_retryable());
    }

    #[test]
    fn test_rejected_shows_validation_text() {
        let err: SyncError = ValidationError::OutOfRange {
            field: "amount".into(),
            min: 10,
            max: 200,
        }
        .into();
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), "amount must be between 10 and 200");
    }

    #[test]
    fn test_timeout_keeps_sub_second_precision() {
        let err = SyncError::timed_out(std::time::Duration::from_millis(500));
        assert!(matches!(err, SyncError::Timeout(500)));
        assert_eq!(err.to_string(), "Connection timeout after 500 ms");
        assert!(!SyncError::NotConnected.is_user_error());
    }

    #[test]
    fn test_categories_are_disjoint() {
        let err = SyncError::InvalidUrl("nope".into());
        assert!(err.is_config_error());
        assert!(!err.is_protocol_error());

        let err = SyncError::DeserializationFailed("eof".into());
        assert!(err.is_protocol_error());
        assert!(!err.is_retryable());
    }
}
