//! Retries with decorrelated-jitter exponential backoff.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub retries: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            retries: 2,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without waiting.
    pub fn immediate(retries: u32) -> Self {
        Self {
            base_delay: Duration::ZERO,
            retries,
            max_delay: Duration::ZERO,
        }
    }

    /// Next wait: uniformly between the base delay and three times the
    /// previous wait, capped at `max_delay`.
    pub fn next_delay<R: Rng + ?Sized>(&self, previous: Duration, rng: &mut R) -> Duration {
        let low = self.base_delay.as_millis() as u64;
        let high = (previous.as_millis() as u64).saturating_mul(3).max(low);
        let millis = if high > low { rng.gen_range(low..=high) } else { low };
        Duration::from_millis(millis).min(self.max_delay)
    }

    /// Runs `operation` until it succeeds or the retries are used up; the
    /// last error is returned.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut delay = self.base_delay;
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    delay = self.next_delay(delay, &mut rand::thread_rng());
                    warn!(
                        "{label} failed (attempt {attempt} of {}): {e}; retrying in {delay:?}",
                        self.retries + 1
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
