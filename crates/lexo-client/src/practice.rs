//! Offline practice rounds.
//!
//! A single-player round that runs entirely on the client: a balanced pool,
//! the same local checks as networked play, local scoring, and letter
//! replacement after every accepted word. Word validity comes from an
//! injected [`Lexicon`]; the default accepts every well-formed word.
//!
//! The timer is derived the same way as in networked play, from a start
//! anchor with zero clock offset, so it survives the process being suspended.

use std::collections::BTreeSet;

use lexo_core::{clock, engine};
use lexo_proto::Letter;
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::{error::ValidationError, submission::WordRules};

/// Dictionary collaborator deciding whether a word exists.
pub trait Lexicon {
    /// Whether `word` (normalized) is a real word.
    fn contains(&self, word: &str) -> bool;
}

/// Lexicon that accepts every word.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Lexicon for AcceptAll {
    fn contains(&self, _word: &str) -> bool {
        true
    }
}

impl Lexicon for BTreeSet<String> {
    fn contains(&self, word: &str) -> bool {
        BTreeSet::contains(self, word)
    }
}

/// Practice round configuration.
#[derive(Debug, Clone)]
pub struct PracticeConfig {
    /// Letters dealt.
    pub pool_size: usize,
    /// Round length in seconds.
    pub duration_seconds: u32,
    /// Length bounds.
    pub rules: WordRules,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self { pool_size: 16, duration_seconds: 60, rules: WordRules::default() }
    }
}

/// Why a practice word was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PracticeError {
    /// Failed a local check.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Not in the lexicon.
    #[error("\"{text}\" is not a known word")]
    UnknownWord {
        /// Normalized word.
        text: String,
    },

    /// The round is over.
    #[error("time is up")]
    TimeUp,
}

/// An accepted practice word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeWord {
    /// Normalized text.
    pub text: String,
    /// Points scored.
    pub score: u32,
}

/// End-of-round totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeSummary {
    /// Accepted words in order.
    pub words: Vec<PracticeWord>,
    /// Sum of all word scores.
    pub total: u32,
    /// Highest-scoring word, earliest on ties.
    pub best: Option<PracticeWord>,
}

/// A running practice round.
#[derive(Debug)]
pub struct PracticeSession<L, R> {
    config: PracticeConfig,
    lexicon: L,
    rng: R,
    pool: Vec<Letter>,
    words: Vec<PracticeWord>,
    used: BTreeSet<String>,
    started_at_ms: u64,
}

impl<L: Lexicon, R: Rng> PracticeSession<L, R> {
    /// Deal a balanced pool and start the clock at `now_ms`.
    pub fn new(config: PracticeConfig, lexicon: L, mut rng: R, now_ms: u64) -> Self {
        let pool = engine::generate_balanced_pool(config.pool_size, &mut rng);
        debug!(pool = %pool.iter().collect::<String>(), "practice round dealt");
        Self {
            config,
            lexicon,
            rng,
            pool,
            words: Vec::new(),
            used: BTreeSet::new(),
            started_at_ms: now_ms,
        }
    }

    /// Current pool.
    pub fn pool(&self) -> &[Letter] {
        &self.pool
    }

    /// Accepted words so far.
    pub fn words(&self) -> &[PracticeWord] {
        &self.words
    }

    /// Running total.
    pub fn total(&self) -> u32 {
        self.words.iter().map(|w| w.score).sum()
    }

    /// Whole seconds left at `now_ms`.
    pub fn remaining(&self, now_ms: u64) -> u32 {
        clock::remaining(self.config.duration_seconds, self.started_at_ms, now_ms, 0)
    }

    /// Whether the round is over at `now_ms`.
    pub fn is_finished(&self, now_ms: u64) -> bool {
        self.remaining(now_ms) == 0
    }

    /// Play a word.
    ///
    /// # Errors
    ///
    /// `TimeUp` after the round ends, `Validation` for a failed local check,
    /// `UnknownWord` when the lexicon refuses it.
    pub fn submit(&mut self, candidate: &str, now_ms: u64) -> Result<PracticeWord, PracticeError> {
        if self.is_finished(now_ms) {
            return Err(PracticeError::TimeUp);
        }
        let text = self.config.rules.check(candidate, &self.pool, |t| self.used.contains(t))?;
        if !self.lexicon.contains(&text) {
            return Err(PracticeError::UnknownWord { text });
        }

        let word = PracticeWord { score: engine::score(&text), text };
        self.pool = engine::replace_letters(&word.text, &self.pool, &mut self.rng);
        self.used.insert(word.text.clone());
        self.words.push(word.clone());
        debug!(text = %word.text, score = word.score, "practice word accepted");
        Ok(word)
    }

    /// Close the round and total it up.
    pub fn finish(self) -> PracticeSummary {
        let total = self.total();
        let best = self
            .words
            .iter()
            .fold(None::<&PracticeWord>, |best, w| match best {
                Some(b) if b.score >= w.score => Some(b),
                _ => Some(w),
            })
            .cloned();
        PracticeSummary { words: self.words, total, best }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn session<L: Lexicon>(lexicon: L) -> PracticeSession<L, ChaCha8Rng> {
        PracticeSession::new(PracticeConfig::default(), lexicon, ChaCha8Rng::seed_from_u64(11), 0)
    }

    fn playable(session: &PracticeSession<impl Lexicon, ChaCha8Rng>) -> String {
        session.pool().iter().take(3).collect()
    }

    #[test]
    fn accepted_word_keeps_pool_size() {
        let mut round = session(AcceptAll);
        let word = playable(&round);

        let accepted = round.submit(&word, 1_000).unwrap();
        assert_eq!(accepted.score, engine::score(&word));
        assert_eq!(round.pool().len(), 16);
        assert_eq!(round.total(), accepted.score);
    }

    #[test]
    fn replayed_word_is_rejected() {
        let mut round = session(AcceptAll);
        let word = playable(&round);
        round.submit(&word, 0).unwrap();

        let err = round.submit(&word, 0).unwrap_err();
        assert!(matches!(
            err,
            PracticeError::Validation(ValidationError::AlreadyPlayed { .. })
                | PracticeError::Validation(ValidationError::NotInPool { .. })
        ));
    }

    #[test]
    fn lexicon_is_consulted() {
        let mut round = session(BTreeSet::<String>::new());
        let word = playable(&round);
        assert!(matches!(round.submit(&word, 0), Err(PracticeError::UnknownWord { .. })));
        assert_eq!(round.pool().len(), 16);
    }

    #[test]
    fn timer_runs_from_start() {
        let round = session(AcceptAll);
        assert_eq!(round.remaining(0), 60);
        assert_eq!(round.remaining(59_999), 1);
        assert!(round.is_finished(60_000));
    }

    #[test]
    fn no_words_after_time_up() {
        let mut round = session(AcceptAll);
        let word = playable(&round);
        assert_eq!(round.submit(&word, 61_000), Err(PracticeError::TimeUp));
    }

    #[test]
    fn summary_picks_best() {
        let mut round = session(AcceptAll);
        let first = playable(&round);
        round.submit(&first, 0).unwrap();
        let second: String = round.pool().iter().take(5).collect();
        round.submit(&second, 0).unwrap();

        let summary = round.finish();
        assert_eq!(summary.words.len(), 2);
        assert_eq!(summary.total, engine::score(&first) + engine::score(&second));
        let best = summary.best.unwrap();
        assert_eq!(best.score, engine::score(&first).max(engine::score(&second)));
    }
}
