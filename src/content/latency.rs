//! Simulated storage latency for benchmarks and tests.
//!
//! Compiled only with the `latency-injection` feature.

use std::time::Duration;

/// A fixed delay plus uniform random jitter.
#[derive(Debug, Clone, Copy)]
pub struct InjectedLatency {
    base: Duration,
    jitter: Duration,
}

impl InjectedLatency {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// A constant delay with no jitter.
    pub fn fixed(base: Duration) -> Self {
        Self::new(base, Duration::ZERO)
    }

    /// Pick the delay for one search.
    pub fn sample(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms > 0 {
            fastrand::u64(0..=jitter_ms)
        } else {
            0
        };
        self.base + Duration::from_millis(extra)
    }

    pub async fn apply(&self) {
        tokio::time::sleep(self.sample()).await;
    }
}
