//! Connection error types.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors raised by the connection manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// A send was attempted without an open channel. Nothing is buffered.
    #[error("not connected")]
    NotConnected,

    /// The channel dropped uncleanly and a retry is scheduled.
    #[error("connection lost, reconnecting ({attempt}/{max_attempts})")]
    Dropped {
        /// Retry about to be made.
        attempt: u32,
        /// Retry budget.
        max_attempts: u32,
    },

    /// Operation not valid in the current state.
    #[error("invalid state {state:?} for operation {operation}")]
    InvalidState {
        /// State the manager was in.
        state: ConnectionState,
        /// Operation that was attempted.
        operation: &'static str,
    },
}
