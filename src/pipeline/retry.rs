//! Retry classification and backoff delays for the generation call.
//!
//! ## Retry Strategy
//!
//! Upstream 429 / 503 / 500 responses are transient. When the error payload
//! names a `retryDelay` we honour it plus a safety buffer; otherwise the wait
//! doubles from a multi-second base (`retry_backoff_ms * 2^attempt`), giving
//! 10 s → 20 s → 40 s with the default 5 s base. The wait that precedes the
//! final attempt is capped so a request never sits idle for minutes before
//! falling back.

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static RETRY_DELAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""retryDelay"\s*:\s*"(\d+)(?:\.\d+)?s""#).expect("valid retryDelay regex")
});

/// Whether an upstream error message describes a transient failure.
pub fn is_retryable_message(message: &str) -> bool {
    message.contains("retryDelay")
        || message.contains("429")
        || message.contains("503")
        || message.contains("500")
}

/// Extract the server-suggested delay from a `"retryDelay":"<N>s"` payload.
pub fn parse_suggested_delay(message: &str) -> Option<Duration> {
    RETRY_DELAY_RE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Backoff parameters derived from [`GenerationConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub suggested_delay_buffer: Duration,
    pub final_attempt_cap: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_base: Duration::from_millis(config.retry_backoff_ms),
            suggested_delay_buffer: Duration::from_millis(config.retry_delay_buffer_ms),
            final_attempt_cap: Duration::from_millis(config.final_retry_cap_ms),
        }
    }

    /// Wait before the attempt that follows failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32, error: &GenerationError) -> Duration {
        let delay = match error.suggested_delay() {
            Some(suggested) => suggested.saturating_add(self.suggested_delay_buffer),
            None => self.exponential(attempt),
        };

        if attempt.saturating_add(1) == self.max_attempts {
            delay.min(self.final_attempt_cap)
        } else {
            delay
        }
    }

    fn exponential(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&GenerationConfig::default())
    }
}

/// Suspension point between attempts.
///
/// Production code uses [`TokioSleeper`]; tests substitute a recorder so
/// they can count waits without actually sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Non-blocking wait on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retryable() -> GenerationError {
        GenerationError::from_message("[503 Service Unavailable] model is overloaded")
    }

    #[test]
    fn classifies_transient_statuses() {
        assert!(is_retryable_message("Request failed with status 429"));
        assert!(is_retryable_message("[503 Service Unavailable]"));
        assert!(is_retryable_message("[500 Internal Server Error]"));
        assert!(is_retryable_message(r#"{"retryDelay":"4s"}"#));
        assert!(!is_retryable_message("[400 Bad Request] invalid argument"));
        assert!(!is_retryable_message("[403 Forbidden] permission denied"));
    }

    #[test]
    fn parses_suggested_delay() {
        assert_eq!(
            parse_suggested_delay(r#"details: [{"retryDelay":"29s"}]"#),
            Some(Duration::from_secs(29))
        );
        assert_eq!(
            parse_suggested_delay(r#"{"retryDelay": "3.5s"}"#),
            Some(Duration::from_secs(3))
        );
        assert_eq!(parse_suggested_delay("retryDelay unknown"), None);
    }

    #[test]
    fn exponential_backoff_sequence() {
        let policy = RetryPolicy {
            max_attempts: 10,
            ..RetryPolicy::default()
        };
        let err = retryable();
        let delays: Vec<u64> = (1..=5)
            .map(|n| policy.delay_after(n, &err).as_secs())
            .collect();
        assert_eq!(delays, vec![10, 20, 40, 80, 160]);
    }

    #[test]
    fn wait_before_final_attempt_is_capped() {
        let policy = RetryPolicy::default();
        let err = retryable();
        assert_eq!(policy.delay_after(3, &err), Duration::from_secs(40));
        assert_eq!(policy.delay_after(4, &err), Duration::from_secs(30));
    }

    #[test]
    fn suggested_delay_gets_buffer() {
        let policy = RetryPolicy::default();
        let err = GenerationError::from_message(r#"[429] {"retryDelay":"7s"}"#);
        assert_eq!(policy.delay_after(1, &err), Duration::from_secs(9));
    }

    #[test]
    fn suggested_delay_is_capped_before_final_attempt() {
        let policy = RetryPolicy::default();
        let err = GenerationError::from_message(r#"[429] {"retryDelay":"58s"}"#);
        assert_eq!(policy.delay_after(2, &err), Duration::from_secs(60));
        assert_eq!(policy.delay_after(4, &err), Duration::from_secs(30));
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        let policy = RetryPolicy {
            max_attempts: u32::MAX,
            ..RetryPolicy::default()
        };
        assert!(policy.delay_after(64, &retryable()) > Duration::from_secs(3600));
    }

    #[test]
    fn last_possible_attempt_does_not_overflow() {
        let policy = RetryPolicy::default();
        let delay = policy.delay_after(u32::MAX, &retryable());
        assert!(delay > Duration::from_secs(3600));

        let capped = RetryPolicy {
            max_attempts: u32::MAX,
            ..RetryPolicy::default()
        };
        assert_eq!(
            capped.delay_after(u32::MAX - 1, &retryable()),
            Duration::from_secs(30)
        );
    }
}
