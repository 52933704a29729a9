//! A virtual clock implementing [`interceptor_core::Environment`] for
//! deterministic tests of one-shot hook timeouts.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use interceptor_core::Environment;

/// Monotonic instant backed by a shared, manually-advanced counter rather
/// than the OS clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VirtualInstant(Duration);

impl std::ops::Sub for VirtualInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// A clock that only advances when [`VirtualClock::advance`] is called, and
/// a `sleep` that resolves the instant the clock passes its deadline.
///
/// Cloning shares the same underlying counter, mirroring how the production
/// `Environment` is cloned cheaply per connection.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Arc<Mutex<Duration>>,
    seed: Arc<Mutex<u64>>,
}

impl VirtualClock {
    /// Start a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self { now: Arc::new(Mutex::new(Duration::ZERO)), seed: Arc::new(Mutex::new(0)) }
    }

    /// Seed the deterministic byte stream `random_bytes` produces.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        let clock = Self::new();
        *clock.seed.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = seed;
        clock
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += duration;
    }

    /// Current virtual time as milliseconds, the unit
    /// [`interceptor_core::Dispatch::register_hook`] expects.
    #[must_use]
    pub fn now_millis(&self) -> u64 {
        let now = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        u64::try_from(now.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Environment for VirtualClock {
    type Instant = VirtualInstant;

    fn now(&self) -> Self::Instant {
        VirtualInstant(*self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner))
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        // xorshift64 — fast, reproducible, not cryptographic (sufficient
        // since this backs only diagnostic correlation ids in tests).
        let mut seed = self.seed.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut state = *seed;
        for byte in buffer.iter_mut() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *byte = (state & 0xff) as u8;
        }
        *seed = state;
    }
}
