//! Errors surfaced by the `lexo` binary.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::terminal::TerminalError;

/// Top-level failure of a `lexo` command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Terminal or socket failure while playing.
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    /// Reading input or writing output failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The word list could not be read.
    #[error("cannot read word list {path}: {source}")]
    Lexicon {
        /// File that was requested.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },

    /// The log filter did not parse.
    #[error("invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber was already installed.
    #[error("cannot install logger: {0}")]
    Logger(String),
}
