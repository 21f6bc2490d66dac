//! Deterministic simulation harness for Lexo client sessions.
//!
//! Virtual-time implementations of the environment and driver, plus a mock
//! authoritative server, so full sessions (including drops, reconnects and
//! resumes) run reproducibly without a network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;

pub use model::{ModelStatus, ModelWorld, Operation, OperationError, OperationResult, WordKind};
pub use sim_driver::{RenderedView, SIM_URL, SimDriver, SimError, SimRuntime, SimSession};
pub use sim_env::SimEnv;
pub use sim_server::SimServer;
