//! Mock authoritative game server.
//!
//! Holds one room with the client under test and a scripted rival. It answers
//! client messages the way the real server does (validation, scoring, letter
//! replacement, resume) and exposes helpers for tests to drive everything
//! else: matchmaking, the round start, rival plays, eliminations and the end
//! of the round.
//!
//! The server shares the simulation's wall clock. Tests that need a skewed
//! server clock pass shifted times explicitly.

use std::collections::{BTreeMap, BTreeSet};

use lexo_core::engine;
use lexo_proto::{
    ClientMessage, EliminationInfo, GameMode, GameResult, Letter, ParticipantId, ParticipantInfo,
    RoomSnapshot, RoomStatus, ScoreEntry, ServerMessage,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Interval between elimination ticks in the multi-party variant.
const ELIMINATION_INTERVAL_MS: u64 = 30_000;

/// Scripted single-room server.
#[derive(Debug)]
pub struct SimServer {
    rng: ChaCha8Rng,
    mode: GameMode,
    duration_seconds: u32,
    dictionary: Option<BTreeSet<String>>,
    preset_pool: Option<Vec<Letter>>,
    participant: Option<ParticipantInfo>,
    rivals: Vec<ParticipantInfo>,
    phase: RoomStatus,
    pool: Vec<Letter>,
    started_at: Option<u64>,
    words: BTreeMap<ParticipantId, Vec<String>>,
    used: BTreeSet<String>,
    scores: BTreeMap<ParticipantId, u32>,
    eliminated: Vec<ParticipantId>,
}

impl SimServer {
    /// Server for a classic round against one rival.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            mode: GameMode::Classic,
            duration_seconds: 60,
            dictionary: None,
            preset_pool: None,
            participant: None,
            rivals: vec![rival(1)],
            phase: RoomStatus::Waiting,
            pool: Vec::new(),
            started_at: None,
            words: BTreeMap::new(),
            used: BTreeSet::new(),
            scores: BTreeMap::new(),
            eliminated: Vec::new(),
        }
    }

    /// Multi-party round against `rivals` scripted opponents.
    #[must_use]
    pub fn battle_royale(mut self, rivals: usize) -> Self {
        self.mode = GameMode::BattleRoyale;
        self.duration_seconds = 240;
        self.rivals = (1..=rivals).map(rival).collect();
        self
    }

    /// Only accept words from `words`.
    #[must_use]
    pub fn with_dictionary<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dictionary = Some(words.into_iter().map(Into::into).collect());
        self
    }

    /// Deal `letters` instead of a random pool.
    #[must_use]
    pub fn with_pool(mut self, letters: &str) -> Self {
        self.preset_pool = Some(letters.chars().collect());
        self
    }

    /// Round length.
    #[must_use]
    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// Identifier assigned to the client under test.
    pub fn participant_id(&self) -> ParticipantId {
        ParticipantId::from("p0")
    }

    /// Identifier of the first rival.
    pub fn rival_id(&self) -> ParticipantId {
        ParticipantId::from("p1")
    }

    /// Server-side room status.
    pub fn phase(&self) -> RoomStatus {
        self.phase
    }

    /// Current pool.
    pub fn pool(&self) -> &[Letter] {
        &self.pool
    }

    /// Every word accepted this round.
    pub fn used_words(&self) -> &BTreeSet<String> {
        &self.used
    }

    /// Words accepted for `id`, in play order.
    pub fn words_of(&self, id: &ParticipantId) -> &[String] {
        self.words.get(id).map_or(&[], Vec::as_slice)
    }

    /// Score for `id`.
    pub fn score_of(&self, id: &ParticipantId) -> u32 {
        self.scores.get(id).copied().unwrap_or(0)
    }

    /// Epoch milliseconds at which the round ends.
    pub fn ends_at(&self) -> Option<u64> {
        self.started_at.map(|start| start + u64::from(self.duration_seconds) * 1000)
    }

    /// Whether the round's end time has passed at `now_ms`.
    pub fn is_over(&self, now_ms: u64) -> bool {
        self.ends_at().is_some_and(|end| now_ms >= end)
    }

    /// Answer one client message.
    pub fn handle(&mut self, message: &ClientMessage, now_ms: u64) -> Vec<ServerMessage> {
        match message {
            ClientMessage::Join { display_name, resume: false, .. } => {
                self.reset_room(display_name);
                vec![ServerMessage::QueueJoined { participant_id: self.participant_id() }]
            },
            ClientMessage::Join { resume: true, .. } => self.resume(now_ms),
            ClientMessage::SubmitWord { text } => vec![self.submit(text, now_ms)],
            ClientMessage::Ping { client_time } => {
                vec![ServerMessage::Pong { server_time: now_ms, echoed_client_time: *client_time }]
            },
            ClientMessage::Pong { .. } | ClientMessage::SendEmote { .. } => vec![],
        }
    }

    /// Announce the match and start the countdown.
    pub fn match_found(&mut self) -> ServerMessage {
        self.phase = RoomStatus::Countdown;
        ServerMessage::MatchFound { opponents: self.rivals.clone() }
    }

    /// Start the round at `now_ms`.
    pub fn start_game(&mut self, now_ms: u64) -> ServerMessage {
        self.phase = RoomStatus::InProgress;
        self.started_at = Some(now_ms);
        self.pool = match &self.preset_pool {
            Some(pool) => pool.clone(),
            None => engine::generate_balanced_pool(self.mode.pool_size(), &mut self.rng),
        };
        ServerMessage::GameStart {
            pool: self.pool.clone(),
            duration_seconds: self.duration_seconds,
            server_start_time: now_ms,
            mode: self.mode,
            scoreboard: self.scoreboard(),
            elimination: self.elimination_info(now_ms),
        }
    }

    /// The first rival plays the first unused word the pool allows.
    ///
    /// Returns `None` if no word of two to four letters is available.
    pub fn rival_plays(&mut self) -> Option<ServerMessage> {
        let candidates: Vec<String> = (2..=4)
            .flat_map(|len| self.pool.windows(len).map(|w| w.iter().collect::<String>()))
            .collect();
        let text = candidates.into_iter().find(|w| !self.used.contains(w))?;
        Some(self.rival_plays_word(&text))
    }

    /// The first rival plays `text`, whether or not the pool allows it.
    pub fn rival_plays_word(&mut self, text: &str) -> ServerMessage {
        let id = self.rival_id();
        let score = self.apply_word(&id, text);
        ServerMessage::OpponentWord {
            participant_id: id,
            text: text.to_string(),
            score,
            updated_pool: self.pool.clone(),
            scoreboard: self.scoreboard(),
        }
    }

    /// Eliminate `ids`.
    pub fn eliminate(&mut self, ids: &[ParticipantId]) -> ServerMessage {
        self.eliminated.extend(ids.iter().cloned());
        ServerMessage::Eliminated {
            participant_ids: ids.to_vec(),
            count: None,
            scoreboard: self.scoreboard(),
        }
    }

    /// Ranking broadcast with the next elimination tick.
    pub fn leaderboard(&self, now_ms: u64) -> ServerMessage {
        ServerMessage::LeaderboardUpdate {
            scoreboard: self.scoreboard(),
            elimination: self.elimination_info(now_ms),
        }
    }

    /// End the round.
    pub fn game_over(&mut self) -> ServerMessage {
        self.phase = RoomStatus::Finished;
        ServerMessage::GameOver { scoreboard: self.scoreboard(), result: self.result(), reason: None }
    }

    /// Full room state as seen by the client under test.
    pub fn snapshot(&self) -> RoomSnapshot {
        let mut roster: Vec<ParticipantInfo> = self.participant.iter().cloned().collect();
        roster.extend(self.rivals.iter().cloned());
        RoomSnapshot {
            status: self.phase,
            mode: self.mode,
            participant_id: Some(self.participant_id()),
            roster,
            pool: self.pool.clone(),
            scoreboard: self.scoreboard(),
            words: self.words.clone(),
            used_words: self.used.iter().cloned().collect(),
            server_start_time: self.started_at,
            duration_seconds: self.started_at.map(|_| self.duration_seconds),
            is_viewer: false,
            eliminated: self.eliminated.clone(),
        }
    }

    fn reset_room(&mut self, display_name: &str) {
        debug!(%display_name, "fresh join");
        self.participant = Some(ParticipantInfo {
            id: self.participant_id(),
            name: display_name.to_string(),
            is_viewer: false,
        });
        self.phase = RoomStatus::Waiting;
        self.pool.clear();
        self.started_at = None;
        self.words.clear();
        self.used.clear();
        self.scores.clear();
        self.eliminated.clear();
    }

    fn resume(&mut self, now_ms: u64) -> Vec<ServerMessage> {
        let live = self.participant.is_some()
            && match self.phase {
                RoomStatus::Waiting | RoomStatus::Countdown => true,
                RoomStatus::InProgress => !self.is_over(now_ms),
                RoomStatus::Finished => false,
            };
        if !live {
            debug!(phase = ?self.phase, "resume refused");
            return vec![ServerMessage::Expired];
        }
        vec![ServerMessage::RoomState { snapshot: self.snapshot() }]
    }

    fn submit(&mut self, text: &str, now_ms: u64) -> ServerMessage {
        let rejected = |reason: &str| ServerMessage::WordRejected {
            text: Some(text.to_string()),
            reason: reason.to_string(),
        };
        if self.phase != RoomStatus::InProgress || self.is_over(now_ms) {
            return rejected("round is not in progress");
        }
        if self.used.contains(text) {
            return rejected("word already played");
        }
        if !engine::has_letters_in_pool(text, &self.pool) {
            return rejected("letters not available");
        }
        if self.dictionary.as_ref().is_some_and(|words| !words.contains(text)) {
            return rejected("not a word");
        }

        let id = self.participant_id();
        let score = self.apply_word(&id, text);
        ServerMessage::WordAccepted {
            text: text.to_string(),
            score,
            updated_pool: self.pool.clone(),
            scoreboard: self.scoreboard(),
        }
    }

    fn apply_word(&mut self, id: &ParticipantId, text: &str) -> u32 {
        let score = engine::score(text);
        self.pool = engine::replace_letters(text, &self.pool, &mut self.rng);
        self.used.insert(text.to_string());
        self.words.entry(id.clone()).or_default().push(text.to_string());
        *self.scores.entry(id.clone()).or_default() += score;
        score
    }

    fn scoreboard(&self) -> Vec<ScoreEntry> {
        self.participant
            .iter()
            .chain(&self.rivals)
            .map(|p| ScoreEntry {
                participant_id: p.id.clone(),
                score: self.score_of(&p.id),
                is_eliminated: self.eliminated.contains(&p.id),
            })
            .collect()
    }

    fn elimination_info(&self, now_ms: u64) -> Option<EliminationInfo> {
        (self.mode == GameMode::BattleRoyale).then(|| EliminationInfo {
            next_elimination_at: now_ms + ELIMINATION_INTERVAL_MS,
            participants_per_elimination: 1,
        })
    }

    fn result(&self) -> GameResult {
        let board = self.scoreboard();
        let Some(top) = board.iter().map(|e| e.score).max() else {
            return GameResult::NoContest;
        };
        let leaders: Vec<ParticipantId> =
            board.iter().filter(|e| e.score == top).map(|e| e.participant_id.clone()).collect();
        match leaders.as_slice() {
            [winner] => GameResult::Winner { participant_id: winner.clone(), score: top },
            _ => GameResult::Tie { participant_ids: leaders, score: top },
        }
    }
}

fn rival(n: usize) -> ParticipantInfo {
    ParticipantInfo {
        id: ParticipantId::new(format!("p{n}")),
        name: format!("Rival {n}"),
        is_viewer: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(server: &mut SimServer) {
        let join = ClientMessage::Join {
            identity: "u".into(),
            display_name: "Ada".into(),
            resume: false,
            auth_token: None,
        };
        server.handle(&join, 0);
    }

    #[test]
    fn accepts_feasible_word() {
        let mut server = SimServer::new(1).with_pool("testabcdefghijkl");
        join(&mut server);
        server.start_game(0);

        let replies = server.handle(&ClientMessage::SubmitWord { text: "test".into() }, 10);
        match replies.as_slice() {
            [ServerMessage::WordAccepted { score, updated_pool, .. }] => {
                assert_eq!(*score, 7);
                assert_eq!(updated_pool.len(), 16);
            },
            other => panic!("unexpected replies: {other:?}"),
        }
        assert_eq!(server.score_of(&server.participant_id()), 7);
    }

    #[test]
    fn rejects_replayed_word() {
        let mut server = SimServer::new(1).with_pool("testtestabcdefgh");
        join(&mut server);
        server.start_game(0);
        let word = ClientMessage::SubmitWord { text: "test".into() };
        server.handle(&word, 0);

        let replies = server.handle(&word, 0);
        assert!(matches!(replies.as_slice(), [ServerMessage::WordRejected { .. }]));
    }

    #[test]
    fn resume_after_end_is_expired() {
        let mut server = SimServer::new(1).with_duration(60);
        join(&mut server);
        server.start_game(1_000);
        let resume = ClientMessage::Join {
            identity: "u".into(),
            display_name: "Ada".into(),
            resume: true,
            auth_token: None,
        };

        let replies = server.handle(&resume, 30_000);
        assert!(matches!(replies.as_slice(), [ServerMessage::RoomState { .. }]));
        assert_eq!(server.handle(&resume, 61_000), vec![ServerMessage::Expired]);
    }

    #[test]
    fn tie_when_scores_match() {
        let mut server = SimServer::new(1);
        join(&mut server);
        server.start_game(0);
        assert!(matches!(server.game_over(), ServerMessage::GameOver {
            result: GameResult::Tie { .. },
            ..
        }));
    }
}
