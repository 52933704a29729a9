//! Production [`Environment`] implementation: real OS time and OS entropy.

use std::time::{Duration, Instant};

use interceptor_core::Environment;

/// Wall-clock time via `std::time::Instant`, real sleeps via
/// `tokio::time::sleep`, and OS-provided entropy via `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealEnvironment;

impl Environment for RealEnvironment {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        // Falls back to a timestamp-derived stream if the OS entropy source
        // is unavailable, since this only ever backs diagnostic correlation
        // ids, never anything security-relevant.
        if getrandom::fill(buffer).is_err() {
            let mut state = u64::try_from(
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos())
                    .unwrap_or(0)
                    & u128::from(u64::MAX),
            )
            .unwrap_or(0);
            for byte in buffer.iter_mut() {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                *byte = (state & 0xff) as u8;
            }
        }
    }
}
