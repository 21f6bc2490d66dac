//! Lexo session core logic
//!
//! Pure, deterministic building blocks for the client session layer. Nothing
//! in this crate performs I/O: time and randomness are supplied by the caller,
//! either directly as parameters or through the [`env::Environment`] trait.
//!
//! State machines here return declarative actions that a driver executes,
//! which keeps them testable without a live transport.
//!
//! # Components
//!
//! - [`engine`]: Letter pool generation, scoring, pool feasibility
//! - [`clock`]: Client/server clock offset and countdown derivation
//! - [`connection`]: Connection lifecycle (open, heartbeat, reconnect)
//! - [`mod@env`]: Environment abstraction (time, RNG)
//! - [`error`]: Connection error types

pub mod clock;
pub mod connection;
pub mod engine;
pub mod env;
pub mod error;

pub use clock::{ClockConfig, ClockSync, remaining};
pub use connection::{
    ConnectionAction, ConnectionConfig, ConnectionEvent, ConnectionManager, ConnectionState,
};
pub use env::{Environment, SystemEnv};
pub use error::ConnectionError;
