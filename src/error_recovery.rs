// src/error_recovery.rs
//! Retry with exponential backoff for page fetches.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retries an async operation with exponential backoff while `retryable`
/// accepts the error.
///
/// Each delay is jittered by up to a quarter so parallel callers do not
/// retry in lockstep.
pub async fn retry_with_backoff<F, T, E, Fut>(
    mut operation: F,
    retryable: impl Fn(&E) -> bool,
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut delay = initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && retryable(&e) => {
                let pause = jittered(delay);
                log::warn!(
                    "Attempt {} of {} failed ({}), retrying after {:?}",
                    attempt,
                    max_attempts,
                    e,
                    pause
                );
                tokio::time::sleep(pause).await;

                // Exponential backoff with cap
                delay = std::cmp::min(delay * 2, max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn jittered(delay: Duration) -> Duration {
    let spread = delay.as_millis() as u64 / 4;
    if spread == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::rng().random_range(0..=spread))
}
