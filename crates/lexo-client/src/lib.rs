//! Action-based client for Lexo sessions.
//!
//! The client is a pure state machine: it consumes [`ClientEvent`]s (user
//! commands, server messages, connection lifecycle) and returns
//! [`ClientAction`]s for a runtime to execute. It holds no transport and
//! reads time only through the injected [`lexo_core::Environment`].
//!
//! # Components
//!
//! - [`Client`]: Session orchestrator (Idle, Queued, Matched, Playing, Ended)
//! - [`SessionState`]: Immutable session snapshot and lifecycle edges
//! - [`SubmissionPipeline`]: Local word checks and outcome reconciliation
//! - [`leaderboard`]: Ranking and elimination projection
//! - [`PracticeSession`]: Offline single-player rounds
//! - [`ClientError`]: Error taxonomy surfaced to the user

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod config;
mod error;
mod event;
pub mod leaderboard;
pub mod practice;
mod session;
mod state;
mod submission;

pub use action::{ClientAction, Notification};
pub use config::{ClientConfig, ClientIdentity};
pub use error::{ClientError, ValidationError};
pub use event::ClientEvent;
pub use leaderboard::Standing;
pub use practice::{
    AcceptAll, Lexicon, PracticeConfig, PracticeError, PracticeSession, PracticeSummary,
    PracticeWord,
};
pub use session::Client;
pub use state::{SessionState, SessionStatus};
pub use submission::{Outcome, SubmissionPipeline, WordAttempt, WordRules};
