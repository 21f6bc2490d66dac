//! Session state snapshots.
//!
//! [`SessionState`] is treated as immutable: every transition method takes
//! `&self` and returns the next snapshot. The client swaps snapshots whole,
//! so a handler that bails out early leaves the previous state untouched.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──join──> Queued ──matchFound──> Matched ──gameStart──> Playing
//!  ↑               │                                  ↑          │
//!  │               └──────── resume snapshot ─────────┘          │ gameOver
//!  │                                                             ↓ permanent disconnect
//!  └───────────────────────── leave / reset ─────────────────── Ended
//! ```
//!
//! Any state may fall back to `Idle` on a fatal error or an expired resume.

use std::collections::{BTreeMap, BTreeSet};

use lexo_proto::{
    EliminationInfo, GameMode, GameResult, Letter, ParticipantId, ParticipantInfo, RoomSnapshot,
    RoomStatus, ScoreEntry,
};
use tracing::warn;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// No session.
    #[default]
    Idle,
    /// Join sent, waiting for opponents.
    Queued,
    /// Opponents found, round not started.
    Matched,
    /// Round in progress.
    Playing,
    /// Round over. Waiting for leave or reset.
    Ended,
}

impl SessionStatus {
    /// Whether `self -> next` is an edge of the lifecycle.
    ///
    /// `Queued -> Playing` is the resume jump and is only taken on a server
    /// snapshot. `Ended -> Playing` is never an edge.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use SessionStatus::{Ended, Idle, Matched, Playing, Queued};
        matches!(
            (self, next),
            (Idle, Queued)
                | (Queued, Matched)
                | (Queued, Playing)
                | (Matched, Playing)
                | (Playing, Ended)
                | (_, Idle)
        ) || self == next
    }

    /// Whether a session exists at all.
    #[must_use]
    pub fn is_active(self) -> bool {
        self != Self::Idle
    }
}

/// Immutable snapshot of everything the client knows about the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Lifecycle position.
    pub status: SessionStatus,
    /// Own server-assigned identifier, once known.
    pub participant_id: Option<ParticipantId>,
    /// Game variant of the current round.
    pub mode: GameMode,
    /// Everyone attached to the room.
    pub roster: Vec<ParticipantInfo>,
    /// Current letter pool.
    pub pool: Vec<Letter>,
    /// Last authoritative scores.
    pub scoreboard: Vec<ScoreEntry>,
    /// Own accepted words, in order.
    pub own_words: Vec<String>,
    /// Other participants' accepted words, keyed by who played them.
    pub opponent_words: BTreeMap<ParticipantId, Vec<String>>,
    /// Every accepted word in the session, by anyone.
    pub used_words: BTreeSet<String>,
    /// Server epoch milliseconds at which the round started.
    pub server_start_time: Option<u64>,
    /// Round length.
    pub duration_seconds: Option<u32>,
    /// Pre-game countdown, display only.
    pub countdown: Option<u32>,
    /// Next elimination tick, multi-party variant.
    pub elimination: Option<EliminationInfo>,
    /// Participants removed by elimination ticks.
    pub eliminated: BTreeSet<ParticipantId>,
    /// The local participant is watching, not playing.
    pub is_viewer: bool,
    /// Outcome once the round is over.
    pub result: Option<GameResult>,
    /// Why the round ended, if the server said.
    pub end_reason: Option<String>,
}

impl SessionState {
    /// A fresh session waiting in the queue.
    #[must_use]
    pub fn queued() -> Self {
        Self { status: SessionStatus::Queued, ..Self::default() }
    }

    /// Score of `id` on the current scoreboard.
    #[must_use]
    pub fn score_of(&self, id: &ParticipantId) -> Option<u32> {
        self.scoreboard.iter().find(|e| &e.participant_id == id).map(|e| e.score)
    }

    /// Own score, once the own id is known.
    #[must_use]
    pub fn own_score(&self) -> Option<u32> {
        self.participant_id.as_ref().and_then(|id| self.score_of(id))
    }

    /// Whether `id` is the local participant.
    #[must_use]
    pub fn is_self(&self, id: &ParticipantId) -> bool {
        self.participant_id.as_ref() == Some(id)
    }

    /// Whether the local participant has been eliminated.
    #[must_use]
    pub fn self_eliminated(&self) -> bool {
        self.participant_id.as_ref().is_some_and(|id| self.eliminated.contains(id))
    }

    /// Display name of `id`, if on the roster.
    #[must_use]
    pub fn display_name(&self, id: &ParticipantId) -> Option<&str> {
        self.roster.iter().find(|p| &p.id == id).map(|p| p.name.as_str())
    }

    /// Record the server-assigned own identifier.
    #[must_use]
    pub fn with_participant_id(&self, id: ParticipantId) -> Self {
        Self { participant_id: Some(id), ..self.clone() }
    }

    /// Opponents found.
    #[must_use]
    pub fn matched(&self, opponents: Vec<ParticipantInfo>) -> Self {
        let mut roster: Vec<ParticipantInfo> = self
            .roster
            .iter()
            .filter(|p| self.is_self(&p.id))
            .cloned()
            .collect();
        for opponent in opponents {
            if !roster.iter().any(|p| p.id == opponent.id) {
                roster.push(opponent);
            }
        }
        Self { status: SessionStatus::Matched, roster, ..self.clone() }
    }

    /// Replace the roster.
    #[must_use]
    pub fn with_roster(&self, roster: Vec<ParticipantInfo>) -> Self {
        Self { roster, ..self.clone() }
    }

    /// Set or clear the pre-game countdown.
    #[must_use]
    pub fn with_countdown(&self, countdown: Option<u32>) -> Self {
        Self { countdown, ..self.clone() }
    }

    /// Enter `Playing` from a round start. Everything round-scoped is taken
    /// from the message, nothing carried over.
    #[must_use]
    pub fn started(
        &self,
        pool: Vec<Letter>,
        duration_seconds: u32,
        server_start_time: u64,
        mode: GameMode,
        scoreboard: Vec<ScoreEntry>,
        elimination: Option<EliminationInfo>,
    ) -> Self {
        let scoreboard = if scoreboard.is_empty() { self.zeroed_scores() } else { scoreboard };
        Self {
            status: SessionStatus::Playing,
            participant_id: self.participant_id.clone(),
            mode,
            roster: self.roster.clone(),
            pool,
            scoreboard,
            server_start_time: Some(server_start_time),
            duration_seconds: Some(duration_seconds),
            elimination,
            is_viewer: self.is_viewer,
            ..Self::default()
        }
    }

    /// Re-baseline from a full room snapshot.
    ///
    /// Everything the snapshot carries replaces local state. Status follows
    /// the room: an in-progress room means `Playing`, a counting-down room
    /// `Matched`, a finished room `Ended`. A waiting room keeps the current
    /// status.
    #[must_use]
    pub fn from_snapshot(&self, snapshot: RoomSnapshot) -> Self {
        let status = match snapshot.status {
            RoomStatus::InProgress => SessionStatus::Playing,
            RoomStatus::Countdown => SessionStatus::Matched,
            RoomStatus::Finished => SessionStatus::Ended,
            RoomStatus::Waiting => self.status,
        };
        let participant_id = snapshot.participant_id.or_else(|| self.participant_id.clone());

        let mut own_words = Vec::new();
        let mut opponent_words = BTreeMap::new();
        let mut used_words: BTreeSet<String> = snapshot.used_words.into_iter().collect();
        for (id, words) in snapshot.words {
            used_words.extend(words.iter().cloned());
            if participant_id.as_ref() == Some(&id) {
                own_words = words;
            } else {
                opponent_words.insert(id, words);
            }
        }

        let mut eliminated: BTreeSet<ParticipantId> = snapshot.eliminated.into_iter().collect();
        eliminated.extend(
            snapshot.scoreboard.iter().filter(|e| e.is_eliminated).map(|e| e.participant_id.clone()),
        );

        Self {
            status,
            participant_id,
            mode: snapshot.mode,
            roster: snapshot.roster,
            pool: snapshot.pool,
            scoreboard: snapshot.scoreboard,
            own_words,
            opponent_words,
            used_words,
            server_start_time: snapshot.server_start_time,
            duration_seconds: snapshot.duration_seconds,
            countdown: None,
            elimination: self.elimination.clone(),
            eliminated,
            is_viewer: snapshot.is_viewer,
            result: None,
            end_reason: None,
        }
    }

    /// Own word accepted by the server.
    #[must_use]
    pub fn with_own_word(
        &self,
        text: String,
        updated_pool: Vec<Letter>,
        scoreboard: Vec<ScoreEntry>,
    ) -> Self {
        let mut next = self.with_board(updated_pool, scoreboard);
        next.used_words.insert(text.clone());
        next.own_words.push(text);
        next
    }

    /// Another participant's word, attributed by the id the server sent.
    #[must_use]
    pub fn with_opponent_word(
        &self,
        participant_id: ParticipantId,
        text: String,
        updated_pool: Vec<Letter>,
        scoreboard: Vec<ScoreEntry>,
    ) -> Self {
        let mut next = self.with_board(updated_pool, scoreboard);
        next.used_words.insert(text.clone());
        next.opponent_words.entry(participant_id).or_default().push(text);
        next
    }

    /// Adopt a periodic scoreboard broadcast.
    #[must_use]
    pub fn with_scoreboard(
        &self,
        scoreboard: Vec<ScoreEntry>,
        elimination: Option<EliminationInfo>,
    ) -> Self {
        Self {
            scoreboard: merge_scores(&self.scoreboard, scoreboard),
            elimination: elimination.or_else(|| self.elimination.clone()),
            ..self.clone()
        }
    }

    /// Mark participants eliminated.
    #[must_use]
    pub fn with_eliminated(
        &self,
        removed: impl IntoIterator<Item = ParticipantId>,
        scoreboard: Vec<ScoreEntry>,
    ) -> Self {
        let mut next = if scoreboard.is_empty() {
            self.clone()
        } else {
            Self { scoreboard: merge_scores(&self.scoreboard, scoreboard), ..self.clone() }
        };
        next.eliminated.extend(removed);
        for entry in &mut next.scoreboard {
            if next.eliminated.contains(&entry.participant_id) {
                entry.is_eliminated = true;
            }
        }
        next
    }

    /// Round finished with a server verdict.
    #[must_use]
    pub fn ended(
        &self,
        scoreboard: Vec<ScoreEntry>,
        result: GameResult,
        reason: Option<String>,
    ) -> Self {
        Self {
            status: SessionStatus::Ended,
            scoreboard: merge_scores(&self.scoreboard, scoreboard),
            result: Some(result),
            end_reason: reason,
            ..self.clone()
        }
    }

    /// Round cut short because the server closed the channel for good.
    #[must_use]
    pub fn disconnected(&self) -> Self {
        Self {
            status: SessionStatus::Ended,
            result: Some(GameResult::NoContest),
            end_reason: Some("connection closed".to_string()),
            ..self.clone()
        }
    }

    /// Adopt a new pool and scoreboard without touching word lists.
    #[must_use]
    pub fn with_board(&self, pool: Vec<Letter>, scoreboard: Vec<ScoreEntry>) -> Self {
        if !self.pool.is_empty() && pool.len() != self.pool.len() {
            warn!(before = self.pool.len(), after = pool.len(), "server changed pool size");
        }
        Self { pool, scoreboard: merge_scores(&self.scoreboard, scoreboard), ..self.clone() }
    }

    fn zeroed_scores(&self) -> Vec<ScoreEntry> {
        self.roster
            .iter()
            .filter(|p| !p.is_viewer)
            .map(|p| ScoreEntry {
                participant_id: p.id.clone(),
                score: 0,
                is_eliminated: false,
            })
            .collect()
    }
}

/// Adopt `incoming` as the scoreboard, but never let a participant's score go
/// down within a round. An empty `incoming` keeps `previous`.
fn merge_scores(previous: &[ScoreEntry], incoming: Vec<ScoreEntry>) -> Vec<ScoreEntry> {
    if incoming.is_empty() {
        return previous.to_vec();
    }
    incoming
        .into_iter()
        .map(|mut entry| {
            let known = previous
                .iter()
                .find(|p| p.participant_id == entry.participant_id)
                .filter(|p| p.score > entry.score);
            if let Some(known) = known {
                warn!(
                    participant = %entry.participant_id,
                    known = known.score,
                    incoming = entry.score,
                    "ignoring score decrease"
                );
                entry.score = known.score;
            }
            entry
        })
        .collect()
}
