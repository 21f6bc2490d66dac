//! Record types shared by client and server messages.
//!
//! Identifiers are server-assigned strings. Letters are single `char` tokens,
//! which serialize as one-character JSON strings.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// A single letter token in the shared pool.
pub type Letter = char;

/// Server-assigned participant identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Game variant. Determines pool size and whether eliminations happen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Two-party timed match on a 16-letter pool.
    #[default]
    Classic,
    /// Multi-party match on a 50-letter pool with periodic eliminations.
    BattleRoyale,
}

impl GameMode {
    /// Number of letter slots dealt for this mode.
    pub const fn pool_size(self) -> usize {
        match self {
            Self::Classic => 16,
            Self::BattleRoyale => 50,
        }
    }
}

/// Server-side room lifecycle as reported in snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Waiting for enough participants.
    #[default]
    Waiting,
    /// Pre-game countdown running.
    Countdown,
    /// Round in progress.
    InProgress,
    /// Round finished.
    Finished,
}

/// Public identity of a session participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// Server-assigned identifier.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Late joiner watching the round without playing.
    #[serde(default)]
    pub is_viewer: bool,
}

/// One row of an authoritative scoreboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Participant the score belongs to.
    pub participant_id: ParticipantId,
    /// Total score for the round.
    pub score: u32,
    /// Set once the participant has been eliminated.
    #[serde(default)]
    pub is_eliminated: bool,
}

/// Final verdict of a round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GameResult {
    /// A single winner.
    Winner {
        /// The winning participant.
        participant_id: ParticipantId,
        /// Winning score.
        score: u32,
    },
    /// Two or more participants share the top score.
    Tie {
        /// Participants sharing the top score.
        participant_ids: Vec<ParticipantId>,
        /// Shared score.
        score: u32,
    },
    /// Round ended without a result (for example, everyone left).
    NoContest,
}

/// Schedule of the next elimination tick in the multi-party variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EliminationInfo {
    /// Server epoch milliseconds at which the next elimination happens.
    pub next_elimination_at: u64,
    /// How many participants are removed per tick.
    pub participants_per_elimination: u32,
}

/// Full room state, used to re-baseline after joining or reconnecting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// Server-side room status.
    #[serde(default)]
    pub status: RoomStatus,
    /// Game variant.
    #[serde(default)]
    pub mode: GameMode,
    /// The receiving client's own identifier, if the server includes it.
    #[serde(default)]
    pub participant_id: Option<ParticipantId>,
    /// Everyone attached to the room.
    #[serde(default)]
    pub roster: Vec<ParticipantInfo>,
    /// Current letter pool.
    #[serde(default)]
    pub pool: Vec<Letter>,
    /// Current scores.
    #[serde(default)]
    pub scoreboard: Vec<ScoreEntry>,
    /// Accepted words per participant, in play order.
    #[serde(default)]
    pub words: BTreeMap<ParticipantId, Vec<String>>,
    /// Every word accepted in the room so far.
    #[serde(default)]
    pub used_words: Vec<String>,
    /// Server epoch milliseconds at which the round started.
    #[serde(default)]
    pub server_start_time: Option<u64>,
    /// Round length.
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    /// The receiving client joined as a viewer.
    #[serde(default)]
    pub is_viewer: bool,
    /// Participants eliminated so far, oldest first.
    #[serde(default)]
    pub eliminated: Vec<ParticipantId>,
}
