//! Wire format for the Lexo session protocol.
//!
//! Messages are JSON text frames. Each frame is one internally tagged record
//! whose `"type"` field names the discriminant. The protocol is
//! transport-agnostic; the client ships a WebSocket driver but nothing in this
//! crate depends on it.
//!
//! # Forward compatibility
//!
//! Unknown server discriminants decode to [`ServerMessage::Unknown`] rather
//! than failing, and optional fields default when absent, so a client keeps
//! working when the server adds message types or fields.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod errors;
pub mod message;
pub mod types;

pub use codec::{MAX_MESSAGE_SIZE, decode, encode};
pub use errors::{ProtocolError, Result};
pub use message::{ClientMessage, ServerMessage};
pub use types::{
    EliminationInfo, GameMode, GameResult, Letter, ParticipantId, ParticipantInfo, RoomSnapshot,
    RoomStatus, ScoreEntry,
};
