//! Backoff and retry decisions for transient failures.
//!
//! Three conditions are retried: transport errors, `429 Too Many Requests`,
//! and any `5xx`. Everything else goes straight back to the caller.

use reqwest::StatusCode;
use std::time::Duration;

/// Upper bound on the exponential backoff.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Wait used when a 429 carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Exponential backoff for a 1-based attempt number: 1s, 2s, 4s, ... capped
/// at [`MAX_BACKOFF`].
pub fn backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    if exponent >= 5 {
        return MAX_BACKOFF;
    }
    Duration::from_secs(1u64 << exponent).min(MAX_BACKOFF)
}

/// Parse a `Retry-After` header given in seconds.
///
/// Missing or non-numeric values fall back to [`DEFAULT_RETRY_AFTER`]; `0`
/// means retry immediately.
pub fn parse_retry_after(header: Option<&str>) -> Duration {
    header
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

/// Why an attempt is being retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// The transport failed before a response arrived.
    Network,
    /// The server answered 429.
    RateLimited,
    /// The server answered with a 5xx status.
    ServerError(StatusCode),
}

/// Outcome of asking the policy about a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `wait`, then try again.
    Retry {
        /// How long to wait before the next attempt.
        wait: Duration,
        /// What triggered the retry.
        reason: RetryReason,
    },
    /// Stop and hand the last result to the caller.
    GiveUp,
}

/// Retry limits shared by every request of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts allowed after the first one.
    pub max_retries: u32,
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` retries.
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Total attempts a single call may make.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    fn has_budget(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    /// Decide after attempt `attempt` failed at the transport level.
    pub fn on_network_error(&self, attempt: u32) -> RetryDecision {
        if !self.has_budget(attempt) {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry {
            wait: backoff(attempt),
            reason: RetryReason::Network,
        }
    }

    /// Decide after attempt `attempt` produced `status`.
    pub fn on_status(
        &self,
        attempt: u32,
        status: StatusCode,
        retry_after: Option<&str>,
    ) -> RetryDecision {
        if !self.has_budget(attempt) {
            return RetryDecision::GiveUp;
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return RetryDecision::Retry {
                wait: parse_retry_after(retry_after),
                reason: RetryReason::RateLimited,
            };
        }
        if status.is_server_error() {
            return RetryDecision::Retry {
                wait: backoff(attempt),
                reason: RetryReason::ServerError(status),
            };
        }
        RetryDecision::GiveUp
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        let waits: Vec<u64> = (1..=7).map(|a| backoff(a).as_secs()).collect();
        assert_eq!(waits, vec![1, 2, 4, 8, 16, 30, 30]);
        assert_eq!(backoff(100), MAX_BACKOFF);
        assert_eq!(backoff(u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(None), Duration::from_secs(1));
        assert_eq!(parse_retry_after(Some("")), Duration::from_secs(1));
        assert_eq!(parse_retry_after(Some("5")), Duration::from_secs(5));
        assert_eq!(parse_retry_after(Some("0")), Duration::ZERO);
        assert_eq!(parse_retry_after(Some("invalid")), Duration::from_secs(1));
    }

    #[test]
    fn test_network_errors_use_backoff() {
        let policy = RetryPolicy::new(2);
        assert_eq!(
            policy.on_network_error(1),
            RetryDecision::Retry {
                wait: Duration::from_secs(1),
                reason: RetryReason::Network
            }
        );
        assert_eq!(
            policy.on_network_error(2),
            RetryDecision::Retry {
                wait: Duration::from_secs(2),
                reason: RetryReason::Network
            }
        );
        assert_eq!(policy.on_network_error(3), RetryDecision::GiveUp);
    }

    #[test]
    fn test_status_decisions() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);

        assert_eq!(
            policy.on_status(1, StatusCode::TOO_MANY_REQUESTS, Some("7")),
            RetryDecision::Retry {
                wait: Duration::from_secs(7),
                reason: RetryReason::RateLimited
            }
        );
        assert_eq!(
            policy.on_status(3, StatusCode::BAD_GATEWAY, None),
            RetryDecision::Retry {
                wait: Duration::from_secs(4),
                reason: RetryReason::ServerError(StatusCode::BAD_GATEWAY)
            }
        );
        assert_eq!(
            policy.on_status(4, StatusCode::SERVICE_UNAVAILABLE, None),
            RetryDecision::GiveUp
        );

        for status in [StatusCode::OK, StatusCode::BAD_REQUEST, StatusCode::NOT_FOUND] {
            assert_eq!(policy.on_status(1, status, None), RetryDecision::GiveUp);
        }
    }

    #[test]
    fn test_zero_retries_never_retries() {
        let policy = RetryPolicy::new(0);
        assert_eq!(policy.on_network_error(1), RetryDecision::GiveUp);
        assert_eq!(
            policy.on_status(1, StatusCode::INTERNAL_SERVER_ERROR, None),
            RetryDecision::GiveUp
        );
    }
}
