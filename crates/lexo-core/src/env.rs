//! Environment abstraction.
//!
//! State machines never read clocks or RNGs directly. Production code uses
//! [`SystemEnv`]; tests substitute a virtual environment whose time only moves
//! when the test advances it.

use std::{
    future::Future,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use rand::RngCore;

/// Source of time and randomness.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic time, used for scheduling heartbeats and reconnects.
    fn now(&self) -> Instant;

    /// Wall clock in epoch milliseconds, used for server clock alignment.
    fn wall_clock_ms(&self) -> u64;

    /// Wait for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// A random `u64`, typically used to seed a local RNG.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }
}

/// Environment backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_clock_ms(&self) -> u64 {
        // A clock set before 1970 reads as zero rather than failing.
        SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis() as u64)
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        rand::thread_rng().fill_bytes(buffer);
    }
}
