//! Word submission pipeline.
//!
//! A candidate goes through local checks before anything is sent:
//!
//! 1. Normalize (trim, case-fold)
//! 2. Letters only, within the length bounds
//! 3. Not already accepted in this session, not already awaiting a verdict
//! 4. Letter multiset available in the current pool
//!
//! Anything that fails is rejected with a [`ValidationError`] and never
//! reaches the network. Anything that passes becomes a pending
//! [`WordAttempt`] until the server's outcome arrives.
//!
//! Outcomes are matched to attempts by text when the server echoes it, and
//! otherwise to the oldest pending attempt. The channel is ordered within a
//! connection, so the oldest pending attempt is the one being answered.

use std::{collections::VecDeque, time::Instant};

use lexo_core::engine;
use tracing::debug;

use crate::{error::ValidationError, state::SessionState};

/// Verdict on a submitted word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Awaiting the server.
    Pending,
    /// Accepted for this many points.
    Accepted {
        /// Server-awarded points.
        score: u32,
    },
    /// Refused by the server.
    Rejected {
        /// Server's reason.
        reason: String,
    },
}

/// One submitted word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordAttempt {
    /// Normalized text.
    pub text: String,
    /// Local time of submission.
    pub submitted_at: Instant,
    /// Current verdict.
    pub outcome: Outcome,
}

/// Length bounds applied before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRules {
    /// Shortest word accepted.
    pub min_length: usize,
    /// Longest word accepted.
    pub max_length: usize,
}

impl Default for WordRules {
    fn default() -> Self {
        Self { min_length: 2, max_length: 15 }
    }
}

impl WordRules {
    /// Normalize `candidate` and check it against everything that can be
    /// decided locally. Returns the normalized text.
    ///
    /// # Errors
    ///
    /// The first check that fails, in pipeline order.
    pub fn check(
        &self,
        candidate: &str,
        pool: &[lexo_proto::Letter],
        played: impl Fn(&str) -> bool,
    ) -> Result<String, ValidationError> {
        let text = engine::normalize(candidate);
        if text.is_empty() {
            return Err(ValidationError::Empty);
        }
        if !text.chars().all(char::is_alphabetic) {
            return Err(ValidationError::InvalidCharacters);
        }

        let len = text.chars().count();
        if len < self.min_length {
            return Err(ValidationError::TooShort { min: self.min_length });
        }
        if len > self.max_length {
            return Err(ValidationError::TooLong { max: self.max_length });
        }
        if played(&text) {
            return Err(ValidationError::AlreadyPlayed { text });
        }
        if !engine::has_letters_in_pool(&text, pool) {
            return Err(ValidationError::NotInPool { text });
        }
        Ok(text)
    }
}

/// Tracks submissions awaiting a verdict.
#[derive(Debug, Clone, Default)]
pub struct SubmissionPipeline {
    rules: WordRules,
    pending: VecDeque<WordAttempt>,
    resolved: Vec<WordAttempt>,
}

impl SubmissionPipeline {
    /// Create an empty pipeline.
    pub fn new(rules: WordRules) -> Self {
        Self { rules, pending: VecDeque::new(), resolved: Vec::new() }
    }

    /// Rules in use.
    pub fn rules(&self) -> WordRules {
        self.rules
    }

    /// Attempts awaiting a verdict, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &WordAttempt> {
        self.pending.iter()
    }

    /// Attempts that received a verdict this session, in arrival order.
    pub fn resolved(&self) -> &[WordAttempt] {
        &self.resolved
    }

    /// Run the local checks against `state`. Returns the normalized text.
    ///
    /// # Errors
    ///
    /// Returns the first failing check. Nothing is recorded on failure.
    pub fn validate(&self, candidate: &str, state: &SessionState) -> Result<String, ValidationError> {
        let text = self.rules.check(candidate, &state.pool, |t| state.used_words.contains(t))?;
        if self.pending.iter().any(|a| a.text == text) {
            return Err(ValidationError::AlreadyPending { text });
        }
        Ok(text)
    }

    /// Record a validated word as sent.
    pub fn begin(&mut self, text: String, now: Instant) {
        debug!(%text, "submission pending");
        self.pending.push_back(WordAttempt { text, submitted_at: now, outcome: Outcome::Pending });
    }

    /// Resolve the attempt for `text` as accepted.
    ///
    /// Returns `None` when no attempt matches, which happens for outcomes
    /// that arrive after the session was reset.
    pub fn accept(&mut self, text: &str, score: u32) -> Option<WordAttempt> {
        self.resolve(Some(text), Outcome::Accepted { score })
    }

    /// Resolve an attempt as rejected. `text` is used for matching when the
    /// server echoed it.
    pub fn reject(&mut self, text: Option<&str>, reason: &str) -> Option<WordAttempt> {
        self.resolve(text, Outcome::Rejected { reason: reason.to_string() })
    }

    /// Drop all pending attempts. No cancel is sent; late outcomes will find
    /// nothing to match.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        if dropped > 0 {
            debug!(dropped, "discarding pending submissions");
        }
        self.pending.clear();
        dropped
    }

    /// Forget everything, for a new session.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.resolved.clear();
    }

    fn resolve(&mut self, text: Option<&str>, outcome: Outcome) -> Option<WordAttempt> {
        let index = match text {
            Some(text) => self.pending.iter().position(|a| a.text == text),
            None => (!self.pending.is_empty()).then_some(0),
        }?;
        let mut attempt = self.pending.remove(index)?;
        attempt.outcome = outcome;
        self.resolved.push(attempt.clone());
        Some(attempt)
    }
}
