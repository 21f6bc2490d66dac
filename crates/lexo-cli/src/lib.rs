//! Terminal client for Lexo
//!
//! A thin shell over [`lexo_app::Driver`] that provides line-mode terminal
//! I/O and a WebSocket transport. All orchestration logic lives in the
//! generic [`lexo_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod args;
pub mod commands;
mod error;
pub mod practice;
pub mod render;
pub mod terminal;

pub use args::{Cli, Mode, PlayArgs, PracticeArgs};
pub use commands::Command;
pub use error::CliError;
pub use terminal::{TerminalDriver, TerminalError};
