//! Retry with exponential backoff for transient API failures.
//!
//! Errors are classified by their message: HTTP 429/5xx and network-level
//! failures are transient, 4xx client errors are not.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Backoff settings for [`retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 = fail immediately).
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Scale each delay by a per-attempt factor in `0.6..=0.9`.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(750),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = (self.initial_delay.as_secs_f64() * self.multiplier.powi(exp))
            .min(self.max_delay.as_secs_f64());
        let factor = if self.jitter {
            [0.8, 0.65, 0.9, 0.6][attempt as usize % 4]
        } else {
            1.0
        };
        Duration::from_secs_f64(secs * factor)
    }
}

/// Whether an error message describes a failure worth retrying.
pub fn is_transient_error(error: &str) -> bool {
    if ["429", "500", "502", "503", "504"]
        .iter()
        .any(|code| error.contains(&format!("HTTP {code}")))
    {
        return true;
    }
    let lower = error.to_lowercase();
    [
        "request failed:",
        "connection reset",
        "connection refused",
        "timed out",
        "broken pipe",
    ]
    .iter()
    .any(|p| lower.contains(p))
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
pub async fn retry<T, F, Fut>(config: &RetryConfig, label: &str, mut op: F) -> Result<T, String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries && is_transient_error(&e) => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "{label} failed (attempt {}/{}): {e}; retrying in {:.1}s",
                    attempt + 1,
                    config.max_retries + 1,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(retries: u32) -> RetryConfig {
        RetryConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            ..RetryConfig::with_retries(retries)
        }
    }

    #[test]
    fn delays_grow_until_capped() {
        let config = RetryConfig {
            jitter: false,
            max_delay: Duration::from_secs(3),
            ..RetryConfig::default()
        };
        let d0 = config.delay_for_attempt(0);
        let d1 = config.delay_for_attempt(1);
        assert!(d1 > d0);
        assert_eq!(config.delay_for_attempt(20), Duration::from_secs(3));
    }

    #[test]
    fn jitter_never_exceeds_base_delay() {
        let jittered = RetryConfig::default();
        let plain = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };
        for attempt in 0..6 {
            assert!(jittered.delay_for_attempt(attempt) <= plain.delay_for_attempt(attempt));
        }
    }

    #[test]
    fn classifies_errors() {
        assert!(is_transient_error("Groq API HTTP 429 Too Many Requests: slow down"));
        assert!(is_transient_error("Groq API HTTP 503 Service Unavailable: busy"));
        assert!(is_transient_error("request failed: connection refused"));
        assert!(!is_transient_error("Groq API HTTP 401 Unauthorized: bad key"));
        assert!(!is_transient_error("failed to parse response: EOF"));
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = retry(&fast(2), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err("HTTP 502 Bad Gateway".to_string())
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry(&fast(3), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("HTTP 400 Bad Request".to_string()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry(&fast(2), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("request failed: timed out".to_string()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
