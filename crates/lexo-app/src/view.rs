//! Read-only projection of the session for rendering.

use lexo_client::{SessionState, Standing};
use lexo_core::ConnectionState;

/// Everything a frontend needs to draw one frame.
///
/// Timers are recomputed on every render from the server anchor, so a frame
/// drawn after a suspend shows the true time left.
#[derive(Debug, Clone)]
pub struct View<'a> {
    /// Session snapshot.
    pub state: &'a SessionState,
    /// Channel state.
    pub connection: ConnectionState,
    /// Whole seconds left in the round.
    pub remaining: Option<u32>,
    /// Whole seconds until the next elimination tick.
    pub next_elimination_in: Option<u32>,
    /// Ranked scoreboard.
    pub standings: Vec<Standing>,
    /// Words awaiting a verdict.
    pub pending: Vec<&'a str>,
}
