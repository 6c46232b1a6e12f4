use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Backoff schedule for background store writes
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// ±30% around each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before retry `attempt` (1-based), before jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let growth = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1).min(i32::MAX as u32) as i32);
        let millis = (self.initial_backoff.as_millis() as f64 * growth)
            .min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(millis as u64)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
}

/// Run `op` until it succeeds or the retry budget is spent.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        attempt += 1;
        if attempt > config.max_retries {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = jittered(config.base_delay(attempt), config.jitter);
        warn!(
            error = %err,
            attempt = attempt,
            max_retries = config.max_retries,
            delay_ms = delay.as_millis() as u64,
            "Store write failed, backing off"
        );

        tokio::time::sleep(delay).await;
    }
}

fn jittered(base: Duration, jitter: bool) -> Duration {
    if !jitter {
        return base;
    }
    base.mul_f64(rand::thread_rng().gen_range(0.7..1.3))
}
