//! Environment abstraction for deterministic testing.
//!
//! Decouples the Handler Pipeline's one-shot hook timers (spec §4.1) from
//! system resources, so timer expiry can be driven by a virtual clock in
//! tests instead of `tokio::time::sleep`. Randomness is kept in the same
//! trait purely for diagnostic correlation identifiers — the Dispatch Core
//! performs no cryptographic or protocol-security-relevant operations, so
//! unlike the teacher's own `Environment` there is no `random_u128`.
use std::time::Duration;

/// Abstract environment providing time, randomness, and async sleep.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards.
/// - `sleep()` resolves no earlier than the requested duration.
/// - `random_bytes()` is deterministic given the same seed, so tests built
///   on it reproduce.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; test environments
    /// may use a virtual clock advanced manually.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the only async method in the trait; it backs one-shot hook
    /// timeouts (spec §4.1) and is never called from pipeline logic that
    /// must stay synchronous.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// A random `u64`, used only as a diagnostic correlation identifier
    /// (never for anything protocol-security-relevant, since the Dispatch
    /// Core does no cryptography) — e.g. tagging one `handle` invocation's
    /// log lines so they can be grepped together.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
