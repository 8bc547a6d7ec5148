//! Retry behavior for the outbound source client.
//!
//! Backoff is exponential with jitter, capped, and respects a server-provided
//! Retry-After when one is present.

use rand::Rng;
use std::time::Duration;

/// Configuration for HTTP retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay to wait (prevents excessive waits)
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            ..Self::default()
        }
    }

    /// Calculate delay for the next retry attempt.
    pub fn calculate_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        // If the server provided a Retry-After hint, respect it
        if let Some(server_delay) = retry_after {
            return server_delay.min(self.max_delay);
        }

        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let backoff =
            Duration::from_millis((self.base_delay.as_millis() as f64 * multiplier) as u64);
        let capped = backoff.min(self.max_delay);

        // Jitter up to 25% on top keeps synchronized retries from stampeding
        let jitter_budget = capped.as_millis() as u64 / 4;
        let jitter = if jitter_budget > 0 {
            rand::thread_rng().gen_range(0..=jitter_budget)
        } else {
            0
        };
        (capped + Duration::from_millis(jitter)).min(self.max_delay)
    }
}

/// Parse the Retry-After header from an HTTP 429 response, if present.
pub fn retry_after_hint(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_calculate_delay_with_retry_after() {
        let policy = RetryPolicy::default();
        let server_delay = Some(Duration::from_secs(10));
        assert_eq!(policy.calculate_delay(1, server_delay), Duration::from_secs(10));
    }

    #[test]
    fn test_retry_after_capped_by_max_delay() {
        let policy = RetryPolicy::default();
        let server_delay = Some(Duration::from_secs(600));
        assert_eq!(policy.calculate_delay(0, server_delay), policy.max_delay);
    }

    #[test]
    fn test_calculate_delay_exponential_backoff() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        };
        // Jitter adds at most 25%, so consecutive attempts still grow
        let delay1 = policy.calculate_delay(1, None);
        let delay3 = policy.calculate_delay(3, None);
        assert!(delay3 > delay1);
    }

    #[test]
    fn test_delay_never_exceeds_max() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(15),
            backoff_multiplier: 3.0,
        };
        assert!(policy.calculate_delay(8, None) <= Duration::from_secs(15));
    }

    #[test]
    fn test_retry_after_header_parsing() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("retry-after", "30".parse().unwrap());
        assert_eq!(retry_after_hint(&headers), Some(Duration::from_secs(30)));

        let empty = reqwest::header::HeaderMap::new();
        assert_eq!(retry_after_hint(&empty), None);
    }
}
