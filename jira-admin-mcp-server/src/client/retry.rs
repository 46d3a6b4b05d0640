//! Retry handler - Exponential Backoff Implementation
//!
//! Atlassian Cloud answers with 429 when a tenant exceeds its rate limit and
//! occasionally with 5xx during deployments. Both are retried here with
//! separate policies; every other status is handed back untouched so the
//! caller can classify it.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Backoff parameters for one class of retryable responses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; N retries means up to N+1 requests
    pub max_retries: u32,
    /// Delay before the first retry, in seconds
    pub initial_delay_secs: f64,
    /// Ceiling applied to every delay, including server-supplied hints
    pub max_delay_secs: f64,
    /// Growth factor between consecutive retries
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Policy for HTTP 429: 5 retries, 5s initial, 60s ceiling
    pub const fn rate_limit() -> Self {
        Self {
            max_retries: 5,
            initial_delay_secs: 5.0,
            max_delay_secs: 60.0,
            multiplier: 2.0,
        }
    }

    /// Policy for HTTP 5xx: 3 retries, 2s initial, 30s ceiling
    pub const fn server_error() -> Self {
        Self {
            max_retries: 3,
            initial_delay_secs: 2.0,
            max_delay_secs: 30.0,
            multiplier: 2.0,
        }
    }

    /// Delay before the retry that follows `attempt` (zero-based).
    ///
    /// A positive `retry_after` hint replaces the exponential schedule; both
    /// are capped at `max_delay_secs`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<f64>) -> Duration {
        let seconds = match retry_after {
            Some(hint) if hint > 0.0 => hint.min(self.max_delay_secs),
            _ => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                (self.initial_delay_secs * self.multiplier.powi(exponent)).min(self.max_delay_secs)
            }
        };
        Duration::try_from_secs_f64(seconds).unwrap_or_default()
    }

    /// Check that the policy produces usable delays
    pub fn validate(&self, name: &str) -> Result<(), String> {
        let delays_ok = [self.initial_delay_secs, self.max_delay_secs]
            .iter()
            .all(|d| d.is_finite() && *d >= 0.0);
        if !delays_ok {
            return Err(format!(
                "{} retry delays must be finite and non-negative",
                name
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(format!("{} retry multiplier must be at least 1.0", name));
        }
        Ok(())
    }
}

/// A response the retry handler can inspect
///
/// Only the status code and the raw `Retry-After` header are ever looked at;
/// the body is left for the caller.
pub trait RetryableResponse {
    fn status_code(&self) -> u16;
    fn retry_after_header(&self) -> Option<&str>;
}

impl RetryableResponse for reqwest::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    fn retry_after_header(&self) -> Option<&str> {
        self.headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
    }
}

/// Parse a `Retry-After` value given in seconds.
///
/// HTTP dates and other malformed values yield `None`.
pub fn parse_retry_after(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite())
}

/// Exponential backoff retry handler for transient HTTP errors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryHandler {
    #[serde(default = "RetryPolicy::rate_limit")]
    pub rate_limit: RetryPolicy,
    #[serde(default = "RetryPolicy::server_error")]
    pub server_error: RetryPolicy,
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self {
            rate_limit: RetryPolicy::rate_limit(),
            server_error: RetryPolicy::server_error(),
        }
    }
}

impl RetryHandler {
    pub fn new(rate_limit: RetryPolicy, server_error: RetryPolicy) -> Self {
        Self {
            rate_limit,
            server_error,
        }
    }

    /// Policy governing `status_code`, or `None` when it is not retryable
    pub fn policy_for(&self, status_code: u16) -> Option<&RetryPolicy> {
        match status_code {
            429 => Some(&self.rate_limit),
            500..=599 => Some(&self.server_error),
            _ => None,
        }
    }

    /// Run `request` until it yields a non-retryable response or the policy
    /// for the latest status is exhausted.
    ///
    /// Always returns the last response received; classification of failures
    /// is left to the caller. Transport errors from `request` are propagated
    /// immediately and never retried. Attempts are strictly sequential and
    /// each retry starts only after its full delay has elapsed.
    pub async fn execute_with_retry<F, Fut, R, E>(&self, mut request: F) -> Result<R, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        R: RetryableResponse,
    {
        // Once this many retries have happened every policy is exhausted
        let ceiling = self.rate_limit.max_retries.max(self.server_error.max_retries);

        for attempt in 0..ceiling {
            let response = request().await?;
            let status = response.status_code();

            let Some(policy) = self.policy_for(status) else {
                return Ok(response);
            };

            if attempt >= policy.max_retries {
                error!(
                    "Max retries ({}) exhausted for HTTP {}",
                    policy.max_retries, status
                );
                return Ok(response);
            }

            let retry_after = response.retry_after_header().and_then(parse_retry_after);
            let delay = policy.delay_for(attempt, retry_after);

            warn!(
                "HTTP {} received, retrying in {:.1}s (attempt {}/{})",
                status,
                delay.as_secs_f64(),
                attempt + 1,
                policy.max_retries
            );

            drop(response);
            tokio::time::sleep(delay).await;
        }

        let response = request().await?;
        if let Some(policy) = self.policy_for(response.status_code()) {
            error!(
                "Max retries ({}) exhausted for HTTP {}",
                policy.max_retries,
                response.status_code()
            );
        }
        Ok(response)
    }
}
