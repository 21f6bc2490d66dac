//! Client/server clock alignment.
//!
//! The server stamps every round with its own epoch milliseconds. To show a
//! countdown that agrees with the server, the client estimates the offset
//! between the two clocks from heartbeat round trips:
//!
//! ```text
//! offset = server_time + rtt / 2 - local_receipt_time
//! ```
//!
//! The most recent valid sample replaces the previous estimate outright. A
//! sample whose round trip exceeds [`ClockConfig::max_round_trip`] (or is
//! negative, meaning the local clock stepped backwards) is discarded.
//!
//! Countdowns are never decremented locally. Every read recomputes the value
//! from the server anchor with [`remaining`], so time spent suspended or
//! disconnected is accounted for automatically.

use std::time::Duration;

use tracing::{debug, warn};

/// Clock synchronization configuration.
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Samples with a longer round trip than this are discarded.
    pub max_round_trip: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { max_round_trip: Duration::from_secs(10) }
    }
}

/// Offset estimator. Starts at zero until the first valid sample.
#[derive(Debug, Clone, Default)]
pub struct ClockSync {
    config: ClockConfig,
    offset_ms: i64,
    samples: u64,
}

impl ClockSync {
    /// Create an estimator with zero offset.
    pub fn new(config: ClockConfig) -> Self {
        Self { config, offset_ms: 0, samples: 0 }
    }

    /// Current offset estimate in milliseconds (server minus local).
    #[must_use]
    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    /// Number of samples accepted so far.
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Fold in a heartbeat reply.
    ///
    /// `echoed_client_time` is the local timestamp the ping carried,
    /// `server_time` the server's stamp on the pong, and `receipt_ms` the
    /// local wall clock when the pong arrived. Returns the new offset, or
    /// `None` when the sample was discarded.
    pub fn record_pong(
        &mut self,
        echoed_client_time: u64,
        server_time: u64,
        receipt_ms: u64,
    ) -> Option<i64> {
        let rtt = receipt_ms as i64 - echoed_client_time as i64;
        let max = self.config.max_round_trip.as_millis() as i64;
        if rtt < 0 || rtt > max {
            warn!(rtt_ms = rtt, max_ms = max, "discarding clock sample");
            return None;
        }

        self.offset_ms = server_time as i64 + rtt / 2 - receipt_ms as i64;
        self.samples += 1;
        debug!(offset_ms = self.offset_ms, rtt_ms = rtt, "clock offset updated");
        Some(self.offset_ms)
    }

    /// Forget the current estimate.
    pub fn reset(&mut self) {
        self.offset_ms = 0;
        self.samples = 0;
    }

    /// Estimated server wall clock at local time `local_now_ms`.
    #[must_use]
    pub fn server_now(&self, local_now_ms: u64) -> i64 {
        local_now_ms as i64 + self.offset_ms
    }

    /// Whole seconds left in a round, see [`remaining`].
    #[must_use]
    pub fn remaining(&self, duration_seconds: u32, server_start_ms: u64, local_now_ms: u64) -> u32 {
        remaining(duration_seconds, server_start_ms, local_now_ms, self.offset_ms)
    }

    /// Whole seconds until the server instant `deadline_ms`, floored at zero.
    #[must_use]
    pub fn until(&self, deadline_ms: u64, local_now_ms: u64) -> u32 {
        let left = deadline_ms as i64 - self.server_now(local_now_ms);
        left.max(0).div_euclid(1000).min(i64::from(u32::MAX)) as u32
    }
}

/// Whole seconds left in a round of `duration_seconds` that the server started
/// at `server_start_ms`, as seen from local time `local_now_ms`.
///
/// `max(0, duration - floor((local_now + offset - server_start) / 1000))`.
/// Elapsed time is floored at zero, so a slightly fast server clock never
/// yields more than `duration`.
pub fn remaining(
    duration_seconds: u32,
    server_start_ms: u64,
    local_now_ms: u64,
    offset_ms: i64,
) -> u32 {
    let elapsed_ms = local_now_ms as i64 + offset_ms - server_start_ms as i64;
    let elapsed_s = elapsed_ms.div_euclid(1000).max(0);
    (i64::from(duration_seconds) - elapsed_s).max(0) as u32
}
