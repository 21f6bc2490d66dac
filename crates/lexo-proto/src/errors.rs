//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Failures while encoding or decoding wire messages.
///
/// None of these are fatal to a session: a malformed inbound message is
/// logged and dropped.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Message exceeds [`crate::MAX_MESSAGE_SIZE`].
    #[error("message too large: {size} bytes (max {max})")]
    TooLarge {
        /// Observed size in bytes.
        size: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Payload is not valid JSON for the expected message type.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}
