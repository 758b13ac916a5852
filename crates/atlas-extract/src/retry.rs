//! Exponential backoff for rate-limited provider calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

use crate::error::{ExtractError, Result};

/// Substrings (compared case-insensitively) that providers use to signal
/// throttling when the status code alone is not conclusive.
const RATE_LIMIT_MARKERS: [&str; 6] = [
    "resourceexhausted",
    "resource_exhausted",
    "overloaded",
    "serviceunavailable",
    "rate limit",
    "速率",
];

/// Whether an error message reads like a provider rate limit.
pub fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first call.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

fn default_attempts() -> u32 {
    5
}
fn default_base_delay_ms() -> u64 {
    2_000
}
fn default_max_jitter_ms() -> u64 {
    1_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

impl RetryPolicy {
    /// Sleep before retry number `retry` (0-based): `base * 2^retry` plus
    /// uniform jitter in `[0, max_jitter]`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self
            .base_delay_ms
            .saturating_mul(1u64.checked_shl(retry).unwrap_or(u64::MAX));
        let jitter = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.max_jitter_ms)
        };
        Duration::from_millis(base.saturating_add(jitter))
    }
}

/// Run `operation` until it succeeds, fails with a non-rate-limit error, or
/// the attempt budget is spent.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_rate_limited() => return Err(e),
            Err(e) => {
                attempt += 1;
                if attempt >= attempts {
                    return Err(ExtractError::RateLimitExhausted {
                        attempts,
                        message: e.to_string(),
                    });
                }
                let delay = policy.delay_for(attempt - 1);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            attempts: 5,
            base_delay_ms: 1,
            max_jitter_ms: 0,
        }
    }

    fn throttled() -> ExtractError {
        ExtractError::Api {
            provider: "gemini".into(),
            status: 429,
            message: "Quota exceeded".into(),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.base_delay_ms, 2_000);
        assert_eq!(policy.max_jitter_ms, 1_000);
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy {
            attempts: 5,
            base_delay_ms: 2_000,
            max_jitter_ms: 0,
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(16));
    }

    #[test]
    fn test_delay_jitter_bounded() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let d = policy.delay_for(0);
            assert!(d >= Duration::from_secs(2) && d <= Duration::from_secs(3));
        }
    }

    #[test]
    fn test_delay_saturates() {
        let policy = fast();
        assert_eq!(policy.delay_for(200), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_markers() {
        assert!(is_rate_limit_message("429 ResourceExhausted"));
        assert!(is_rate_limit_message("Model is OVERLOADED"));
        assert!(!is_rate_limit_message("invalid api key"));
    }

    #[tokio::test]
    async fn test_recovers_after_rate_limit() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_with_backoff(&fast(), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(throttled())
            } else {
                Ok("graph")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "graph");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = retry_with_backoff(&fast(), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(throttled())
        })
        .await;
        assert!(matches!(
            result,
            Err(ExtractError::RateLimitExhausted { attempts: 5, .. })
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_other_errors_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = retry_with_backoff(&fast(), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ExtractError::Decode("not json".into()))
        })
        .await;
        assert!(matches!(result, Err(ExtractError::Decode(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
