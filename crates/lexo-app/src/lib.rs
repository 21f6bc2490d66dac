//! Application layer for Lexo
//!
//! Generic runtime that wires the session state machine to the connection
//! manager and a platform driver. The same orchestration runs against a real
//! WebSocket in the terminal client and against virtual I/O in simulation.
//!
//! # Components
//!
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver
//! - [`View`]: Read-only projection handed to the driver for rendering

mod driver;
mod runtime;
mod view;

pub use driver::{Driver, DriverEvent};
pub use runtime::Runtime;
pub use view::View;
