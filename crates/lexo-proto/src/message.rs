//! Protocol messages exchanged between the client and the game server.
//!
//! Both directions are internally tagged unions keyed by a `"type"` field.
//! Unknown server discriminants decode to [`ServerMessage::Unknown`] so that
//! older clients keep working against newer servers.

use serde::{Deserialize, Serialize};

use crate::types::{
    EliminationInfo, GameMode, GameResult, Letter, ParticipantId, ParticipantInfo, RoomSnapshot,
    ScoreEntry,
};

/// Messages sent by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter matchmaking, or resume an active session for this identity.
    Join {
        /// Stable player identity.
        identity: String,
        /// Name shown to other participants.
        display_name: String,
        /// Ask the server to resume an existing session.
        #[serde(default)]
        resume: bool,
        /// Bearer credential from the authentication provider.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auth_token: Option<String>,
    },
    /// Submit a normalized candidate word.
    SubmitWord {
        /// Normalized word text.
        text: String,
    },
    /// Client heartbeat carrying the local wall clock.
    Ping {
        /// Client epoch milliseconds at send time.
        client_time: u64,
    },
    /// Answer to a server-initiated ping.
    Pong {
        /// Client epoch milliseconds at send time.
        client_time: u64,
    },
    /// Broadcast a reaction to the other participants.
    SendEmote {
        /// Emote symbol.
        symbol: String,
    },
}

/// Messages sent by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join accepted; the client is waiting for a match.
    QueueJoined {
        /// Identifier assigned to this client.
        participant_id: ParticipantId,
    },
    /// Opponents found; the session is about to start.
    MatchFound {
        /// The other participants.
        opponents: Vec<ParticipantInfo>,
    },
    /// Round begins. Carries the full initial state.
    GameStart {
        /// Initial letter pool.
        pool: Vec<Letter>,
        /// Round length.
        duration_seconds: u32,
        /// Server epoch milliseconds at which the round started.
        server_start_time: u64,
        /// Game variant.
        #[serde(default)]
        mode: GameMode,
        /// Initial scores; empty means everyone starts at zero.
        #[serde(default)]
        scoreboard: Vec<ScoreEntry>,
        /// First elimination tick, multi-party variant only.
        #[serde(default)]
        elimination: Option<EliminationInfo>,
    },
    /// The client's own submission was accepted.
    WordAccepted {
        /// Accepted word.
        text: String,
        /// Points awarded.
        score: u32,
        /// Pool after replacement.
        updated_pool: Vec<Letter>,
        /// Scores after the word was applied.
        scoreboard: Vec<ScoreEntry>,
    },
    /// The client's own submission was rejected.
    WordRejected {
        /// Rejected word, when the server echoes it.
        #[serde(default)]
        text: Option<String>,
        /// Human-readable reason.
        reason: String,
    },
    /// Another participant played a word.
    OpponentWord {
        /// Who played it.
        participant_id: ParticipantId,
        /// Accepted word.
        text: String,
        /// Points awarded.
        score: u32,
        /// Pool after replacement.
        updated_pool: Vec<Letter>,
        /// Scores after the word was applied.
        scoreboard: Vec<ScoreEntry>,
    },
    /// Full room state for joining or resuming.
    RoomState {
        /// The snapshot.
        snapshot: RoomSnapshot,
    },
    /// Pre-game countdown tick.
    Countdown {
        /// Seconds until the round starts.
        seconds_remaining: u32,
    },
    /// Pre-game countdown cancelled.
    CountdownStopped {
        /// Why the countdown stopped.
        #[serde(default)]
        reason: Option<String>,
    },
    /// Round finished.
    GameOver {
        /// Final scores.
        scoreboard: Vec<ScoreEntry>,
        /// Winner or tie.
        result: GameResult,
        /// Why the round ended, if not by timeout.
        #[serde(default)]
        reason: Option<String>,
    },
    /// Someone joined; carries the new roster.
    ParticipantJoined {
        /// Everyone attached to the room.
        roster: Vec<ParticipantInfo>,
    },
    /// Someone left; carries the new roster.
    ParticipantLeft {
        /// Everyone still attached to the room.
        roster: Vec<ParticipantInfo>,
    },
    /// A participant sent a reaction.
    Emote {
        /// Emote symbol.
        symbol: String,
        /// Sender.
        from_participant_id: ParticipantId,
    },
    /// Server-initiated liveness probe.
    Ping {
        /// Server epoch milliseconds at send time.
        server_time: u64,
    },
    /// Answer to a client heartbeat.
    Pong {
        /// Server epoch milliseconds when the ping was handled.
        server_time: u64,
        /// The `client_time` of the ping being answered.
        echoed_client_time: u64,
    },
    /// Elimination tick in the multi-party variant.
    Eliminated {
        /// Participants removed by this tick.
        #[serde(default)]
        participant_ids: Vec<ParticipantId>,
        /// Number removed, when the server sends a count instead of ids.
        #[serde(default)]
        count: Option<u32>,
        /// Scores at the time of elimination.
        #[serde(default)]
        scoreboard: Vec<ScoreEntry>,
    },
    /// Periodic ranking broadcast in the multi-party variant.
    LeaderboardUpdate {
        /// Current scores.
        scoreboard: Vec<ScoreEntry>,
        /// Next elimination tick.
        #[serde(default)]
        elimination: Option<EliminationInfo>,
    },
    /// Resume refused: the session's end time has passed.
    Expired,
    /// Server-side error report.
    Error {
        /// Human-readable message.
        message: String,
    },
    /// A discriminant this client does not understand.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Discriminant name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QueueJoined { .. } => "queue_joined",
            Self::MatchFound { .. } => "match_found",
            Self::GameStart { .. } => "game_start",
            Self::WordAccepted { .. } => "word_accepted",
            Self::WordRejected { .. } => "word_rejected",
            Self::OpponentWord { .. } => "opponent_word",
            Self::RoomState { .. } => "room_state",
            Self::Countdown { .. } => "countdown",
            Self::CountdownStopped { .. } => "countdown_stopped",
            Self::GameOver { .. } => "game_over",
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::ParticipantLeft { .. } => "participant_left",
            Self::Emote { .. } => "emote",
            Self::Ping { .. } => "ping",
            Self::Pong { .. } => "pong",
            Self::Eliminated { .. } => "eliminated",
            Self::LeaderboardUpdate { .. } => "leaderboard_update",
            Self::Expired => "expired",
            Self::Error { .. } => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl ClientMessage {
    /// The same message with the resume flag set, if it is a `Join`.
    ///
    /// Used when re-sending the handshake after an unclean drop so the server
    /// answers with a snapshot instead of a fresh queue slot.
    #[must_use]
    pub fn into_resume(self) -> Self {
        match self {
            Self::Join { identity, display_name, auth_token, .. } => {
                Self::Join { identity, display_name, resume: true, auth_token }
            },
            other => other,
        }
    }

    /// Discriminant name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::SubmitWord { .. } => "submit_word",
            Self::Ping { .. } => "ping",
            Self::Pong { .. } => "pong",
            Self::SendEmote { .. } => "send_emote",
        }
    }
}
