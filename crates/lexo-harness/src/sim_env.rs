//! Virtual-time environment.
//!
//! Time only moves when a test advances it. Clones share the same clock and
//! RNG, so a client, a runtime and a test can all observe one timeline.

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use lexo_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall-clock reading at the start of every simulation (2023-11-14).
pub const SIM_EPOCH_MS: u64 = 1_700_000_000_000;

#[derive(Debug)]
struct SimClock {
    now: Instant,
    elapsed: Duration,
    rng: ChaCha8Rng,
}

/// Environment with virtual time and a seeded RNG.
#[derive(Debug, Clone)]
pub struct SimEnv {
    inner: Arc<Mutex<SimClock>>,
}

impl SimEnv {
    /// Environment seeded with zero.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment with a specific RNG seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimClock {
                now: Instant::now(),
                elapsed: Duration::ZERO,
                rng: ChaCha8Rng::seed_from_u64(seed),
            })),
        }
    }

    /// Move virtual time forward.
    pub fn advance(&self, duration: Duration) {
        let mut clock = self.lock();
        clock.now += duration;
        clock.elapsed += duration;
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    fn lock(&self) -> MutexGuard<'_, SimClock> {
        // A panicking test must not poison the clock for the others sharing it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        self.lock().now
    }

    fn wall_clock_ms(&self) -> u64 {
        SIM_EPOCH_MS + self.lock().elapsed.as_millis() as u64
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.lock().rng.fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let env = SimEnv::new();
        let other = env.clone();
        let start = env.now();

        other.advance(Duration::from_secs(3));
        assert_eq!(env.now() - start, Duration::from_secs(3));
        assert_eq!(env.wall_clock_ms(), SIM_EPOCH_MS + 3_000);
    }

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);
        assert_eq!(a.random_u64(), b.random_u64());
    }

    #[tokio::test]
    async fn sleep_advances_virtual_time() {
        let env = SimEnv::new();
        env.sleep(Duration::from_millis(250)).await;
        assert_eq!(env.elapsed(), Duration::from_millis(250));
    }
}
