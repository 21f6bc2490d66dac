//! Reference model for model-based testing.
//!
//! [`ModelWorld`] is a deliberately simple executable description of how one
//! client session should respond to user commands, server pushes, channel
//! drops and the passage of time. Property tests run the same [`Operation`]
//! sequence against the model and a [`crate::SimSession`] and require the
//! two to agree after every step.
//!
//! The model only tracks what is observable from outside the client: the
//! lifecycle status, whether the channel is up, how many of its own words
//! were accepted, and the result of each command.

use arbitrary::Arbitrary;
use lexo_client::SessionStatus;
use lexo_proto::RoomStatus;

/// Reconnect delay the model assumes (the connection manager's default).
pub const MODEL_RECONNECT_DELAY_MS: u64 = 3_000;

/// Round length the model assumes (the simulated server's default).
pub const MODEL_ROUND_MS: u64 = 60_000;

/// Which kind of word a submit uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum WordKind {
    /// Two unused letters from the current pool.
    Playable,
    /// A single letter.
    TooShort,
    /// The most recent accepted word, or an empty string if there is none.
    Replay,
}

/// One step of a generated test sequence.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// User joins matchmaking.
    Join,
    /// Server announces the match.
    MatchFound,
    /// Server starts the round.
    StartGame,
    /// User submits a word.
    Submit {
        /// What to submit.
        kind: WordKind,
    },
    /// The rival plays a word.
    RivalPlays,
    /// Server ends the round.
    GameOver,
    /// Channel drops uncleanly; the reconnect delay passes.
    Drop,
    /// Virtual time passes.
    AdvanceTime {
        /// How long.
        millis: u16,
    },
    /// User leaves.
    Leave,
    /// User clears a finished session.
    Reset,
}

/// Status as tracked by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    /// No session.
    Idle,
    /// Waiting for a match.
    Queued,
    /// Match found.
    Matched,
    /// Round running.
    Playing,
    /// Round over.
    Ended,
}

impl From<SessionStatus> for ModelStatus {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Idle => Self::Idle,
            SessionStatus::Queued => Self::Queued,
            SessionStatus::Matched => Self::Matched,
            SessionStatus::Playing => Self::Playing,
            SessionStatus::Ended => Self::Ended,
        }
    }
}

/// Why a command was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Command does not apply in the current status.
    WrongStatus,
    /// Word failed a local check.
    InvalidWord,
    /// No open channel.
    NotConnected,
}

/// Outcome of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// Applied (or nothing to do).
    Ok,
    /// Refused.
    Error(OperationError),
}

impl OperationResult {
    /// Whether the operation was applied.
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Reference model of a single client session and its server room.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    status: ModelStatus,
    connected: bool,
    own_words: usize,
    phase: Option<RoomStatus>,
    now_ms: u64,
    round_started_ms: Option<u64>,
}

impl Default for ModelWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelWorld {
    /// Idle client, no room.
    pub fn new() -> Self {
        Self {
            status: ModelStatus::Idle,
            connected: false,
            own_words: 0,
            phase: None,
            now_ms: 0,
            round_started_ms: None,
        }
    }

    /// Expected status.
    pub fn status(&self) -> ModelStatus {
        self.status
    }

    /// Expected channel state.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Expected number of own accepted words.
    pub fn own_words(&self) -> usize {
        self.own_words
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Join => self.join(),
            Operation::MatchFound => {
                if self.connected && self.phase == Some(RoomStatus::Waiting) {
                    self.phase = Some(RoomStatus::Countdown);
                    if self.status == ModelStatus::Queued {
                        self.status = ModelStatus::Matched;
                    }
                }
                OperationResult::Ok
            },
            Operation::StartGame => {
                let startable =
                    matches!(self.phase, Some(RoomStatus::Waiting | RoomStatus::Countdown));
                if self.connected && startable {
                    self.phase = Some(RoomStatus::InProgress);
                    self.round_started_ms = Some(self.now_ms);
                    if matches!(self.status, ModelStatus::Queued | ModelStatus::Matched) {
                        self.status = ModelStatus::Playing;
                    }
                }
                OperationResult::Ok
            },
            Operation::Submit { kind } => self.submit(*kind),
            Operation::RivalPlays => OperationResult::Ok,
            Operation::GameOver => {
                if self.connected && self.phase == Some(RoomStatus::InProgress) {
                    self.phase = Some(RoomStatus::Finished);
                    if self.status == ModelStatus::Playing {
                        self.status = ModelStatus::Ended;
                    }
                }
                OperationResult::Ok
            },
            Operation::Drop => {
                if self.connected {
                    self.now_ms += MODEL_RECONNECT_DELAY_MS;
                    if !self.resume_allowed() {
                        self.to_idle();
                    }
                }
                OperationResult::Ok
            },
            Operation::AdvanceTime { millis } => {
                self.now_ms += u64::from(*millis);
                OperationResult::Ok
            },
            Operation::Leave => {
                if self.status != ModelStatus::Idle {
                    self.to_idle();
                }
                OperationResult::Ok
            },
            Operation::Reset => match self.status {
                ModelStatus::Idle => OperationResult::Ok,
                ModelStatus::Ended => {
                    self.to_idle();
                    OperationResult::Ok
                },
                ModelStatus::Queued | ModelStatus::Matched | ModelStatus::Playing => {
                    OperationResult::Error(OperationError::WrongStatus)
                },
            },
        }
    }

    fn join(&mut self) -> OperationResult {
        if self.status != ModelStatus::Idle {
            return OperationResult::Error(OperationError::WrongStatus);
        }
        self.status = ModelStatus::Queued;
        self.connected = true;
        self.own_words = 0;
        self.phase = Some(RoomStatus::Waiting);
        self.round_started_ms = None;
        OperationResult::Ok
    }

    fn submit(&mut self, kind: WordKind) -> OperationResult {
        if self.status != ModelStatus::Playing {
            return OperationResult::Error(OperationError::WrongStatus);
        }
        if !self.connected {
            return OperationResult::Error(OperationError::NotConnected);
        }
        match kind {
            WordKind::TooShort | WordKind::Replay => {
                OperationResult::Error(OperationError::InvalidWord)
            },
            WordKind::Playable => {
                if !self.round_over() {
                    self.own_words += 1;
                }
                OperationResult::Ok
            },
        }
    }

    fn round_over(&self) -> bool {
        self.round_started_ms.is_some_and(|start| self.now_ms >= start + MODEL_ROUND_MS)
    }

    fn resume_allowed(&self) -> bool {
        match self.phase {
            Some(RoomStatus::Waiting | RoomStatus::Countdown) => true,
            Some(RoomStatus::InProgress) => !self.round_over(),
            Some(RoomStatus::Finished) | None => false,
        }
    }

    fn to_idle(&mut self) {
        self.status = ModelStatus::Idle;
        self.connected = false;
        self.own_words = 0;
    }
}
