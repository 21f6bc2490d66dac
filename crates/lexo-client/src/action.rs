//! Client actions
//!
//! Actions produced by the client state machine for the runtime to execute.

use std::time::Duration;

use lexo_proto::{ClientMessage, GameResult, ParticipantId, ParticipantInfo};

use crate::{error::ClientError, state::SessionStatus};

/// Actions produced by the client state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open the channel. `join` is the handshake to send once it is ready.
    Connect {
        /// Handshake message.
        join: ClientMessage,
    },

    /// Send a message on the open channel.
    Send(ClientMessage),

    /// Close the channel gracefully.
    Disconnect,

    /// Tell the user something.
    Notify(Notification),
}

/// User-facing notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Session moved along its lifecycle.
    StatusChanged {
        /// Previous status.
        from: SessionStatus,
        /// New status.
        to: SessionStatus,
    },

    /// Channel ready.
    Connected {
        /// Replaces a dropped channel.
        reconnect: bool,
    },

    /// Own identifier assigned.
    QueueJoined {
        /// Assigned id.
        participant_id: ParticipantId,
    },

    /// Opponents found.
    MatchFound {
        /// The other participants.
        opponents: Vec<ParticipantInfo>,
    },

    /// State replaced from a server snapshot.
    Resynced,

    /// Pre-game countdown changed. `None` means it stopped.
    Countdown {
        /// Seconds until the round starts.
        seconds_remaining: Option<u32>,
    },

    /// Roster changed.
    RosterChanged {
        /// Everyone attached to the room.
        roster: Vec<ParticipantInfo>,
    },

    /// Own word accepted.
    WordAccepted {
        /// The word.
        text: String,
        /// Points awarded.
        score: u32,
    },

    /// Another participant played a word.
    OpponentWord {
        /// Who.
        participant_id: ParticipantId,
        /// The word.
        text: String,
        /// Points awarded.
        score: u32,
    },

    /// Someone sent a reaction.
    Emote {
        /// Emote symbol.
        symbol: String,
        /// Sender.
        from: ParticipantId,
    },

    /// An elimination tick removed participants.
    Eliminated {
        /// Who was removed.
        participant_ids: Vec<ParticipantId>,
        /// The local participant was among them.
        including_self: bool,
    },

    /// Round over.
    GameOver {
        /// Final verdict.
        result: GameResult,
        /// Why, if not by timeout.
        reason: Option<String>,
    },

    /// Connection lost; reconnecting after `retry_in`.
    Reconnecting {
        /// Retry number.
        attempt: u32,
        /// Retry budget.
        max_attempts: u32,
        /// Delay before the retry.
        retry_in: Duration,
    },

    /// Something went wrong.
    Error(ClientError),

    /// Informational message.
    Notice(String),
}
