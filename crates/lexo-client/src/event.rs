//! Client input events.

use lexo_core::ConnectionEvent;
use lexo_proto::ServerMessage;

/// Inputs to the client state machine.
///
/// User commands, inbound server messages, and connection lifecycle
/// notifications all arrive through this one type and are handled strictly
/// one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Enter matchmaking. With `resume`, ask the server to restore an active
    /// session for this identity instead.
    Join {
        /// Request a resume.
        resume: bool,
    },

    /// Submit a candidate word.
    Submit {
        /// Raw user input.
        text: String,
    },

    /// Send a reaction.
    SendEmote {
        /// Emote symbol.
        symbol: String,
    },

    /// Abandon the session. Closes the channel; pending submissions are
    /// dropped without telling the server.
    Leave,

    /// Clear a finished session.
    Reset,

    /// Message received from the server.
    Message(ServerMessage),

    /// Connection lifecycle change.
    Connection(ConnectionEvent),
}
