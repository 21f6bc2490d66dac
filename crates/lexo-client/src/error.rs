//! Client error taxonomy.
//!
//! Only [`ClientError::Connection`] and [`ClientError::FatalReconnectFailure`]
//! block the user; everything else is a transient notice. No error leaves the
//! session outside its five states.

use lexo_core::ConnectionError;
use thiserror::Error;

use crate::state::SessionStatus;

/// Local pre-submit rejection. No network traffic results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Nothing left after trimming.
    #[error("word is empty")]
    Empty,

    /// Contains something other than letters.
    #[error("word can only contain letters")]
    InvalidCharacters,

    /// Below the minimum length.
    #[error("word must be at least {min} letters")]
    TooShort {
        /// Minimum length.
        min: usize,
    },

    /// Above the maximum length.
    #[error("word cannot exceed {max} letters")]
    TooLong {
        /// Maximum length.
        max: usize,
    },

    /// Already accepted in this session.
    #[error("\"{text}\" has already been played")]
    AlreadyPlayed {
        /// Normalized word.
        text: String,
    },

    /// Already submitted and awaiting an outcome.
    #[error("\"{text}\" is already awaiting a verdict")]
    AlreadyPending {
        /// Normalized word.
        text: String,
    },

    /// Letters are not all available in the pool.
    #[error("\"{text}\" cannot be made from the pool")]
    NotInPool {
        /// Normalized word.
        text: String,
    },

    /// Submissions are only possible during a round.
    #[error("no round in progress")]
    NotPlaying,

    /// Viewers watch; they do not play.
    #[error("viewers cannot submit words")]
    Viewer,

    /// Knocked out by an elimination tick.
    #[error("eliminated participants cannot submit words")]
    Eliminated,
}

/// Errors surfaced by the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Transport failed or dropped uncleanly.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Malformed or unexpected message. Logged, never fatal.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Local pre-submit rejection.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server refused a submitted word.
    #[error("word rejected: {reason}")]
    ServerRejection {
        /// The word, when known.
        text: Option<String>,
        /// Server's reason.
        reason: String,
    },

    /// Resume refused because the session has ended.
    #[error("session expired")]
    SessionExpired,

    /// Reconnect budget exhausted. Requires a manual retry.
    #[error("could not reconnect after {attempts} attempts")]
    FatalReconnectFailure {
        /// Retries made.
        attempts: u32,
    },

    /// Error report from the server.
    #[error("server error: {message}")]
    Server {
        /// Server's message.
        message: String,
    },

    /// Command not available in the current session state.
    #[error("cannot {command} while {status:?}")]
    InvalidCommand {
        /// Session state at the time.
        status: SessionStatus,
        /// Command that was attempted.
        command: &'static str,
    },
}

impl ClientError {
    /// Whether the user must acknowledge or act before continuing.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::FatalReconnectFailure { .. })
    }
}
