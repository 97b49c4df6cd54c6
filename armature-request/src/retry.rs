//! Retry policies and backoff strategies.
//!
//! A [`RetryPolicy`] is immutable configuration. The number of retries
//! already performed is owned by the dispatch loop and handed to the
//! policy on every decision, so one policy can be shared freely between
//! requests running on different threads.

use std::ops::RangeInclusive;
use std::time::Duration;

use crate::HttpClientError;

/// Retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
    /// Exact status codes that should trigger a retry.
    pub retry_status_codes: Vec<u16>,
    /// Inclusive range of status codes that should trigger a retry.
    pub retry_status_range: Option<RangeInclusive<u16>>,
    /// Whether to retry when the attempt failed with an error.
    pub retry_on_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff: BackoffStrategy::Constant(Duration::from_millis(50)),
            retry_status_codes: Vec::new(),
            retry_status_range: Some(500..=504),
            retry_on_error: true,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with a constant interval, a set of exact status
    /// codes and an inclusive status range.
    ///
    /// A range whose `begin` is greater than `end` matches nothing.
    pub fn new(
        max_retries: u32,
        interval: Duration,
        status_codes: impl IntoIterator<Item = u16>,
        status_begin: u16,
        status_end: u16,
    ) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::Constant(interval),
            retry_status_codes: status_codes.into_iter().collect(),
            retry_status_range: (status_begin <= status_end).then_some(status_begin..=status_end),
            retry_on_error: true,
        }
    }

    /// One retry after 50ms on errors and 500-504 responses.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Create a policy with a constant delay that only retries on errors.
    pub fn constant(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::Constant(delay),
            retry_status_range: None,
            ..Default::default()
        }
    }

    /// Create a policy with linear backoff that only retries on errors.
    pub fn linear(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::Linear {
                delay,
                max: Duration::from_secs(30),
            },
            retry_status_range: None,
            ..Default::default()
        }
    }

    /// Create a policy with exponential backoff that only retries on errors.
    pub fn exponential(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::Exponential {
                initial: initial_delay,
                max: Duration::from_secs(30),
                multiplier: 2.0,
            },
            retry_status_range: None,
            ..Default::default()
        }
    }

    /// Create a policy with no delay that only retries on errors.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::None,
            retry_status_range: None,
            ..Default::default()
        }
    }

    /// Replace the exact status codes to retry on.
    pub fn with_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retry_status_codes = codes.into_iter().collect();
        self
    }

    /// Replace the inclusive status range to retry on.
    pub fn with_status_range(mut self, begin: u16, end: u16) -> Self {
        self.retry_status_range = (begin <= end).then_some(begin..=end);
        self
    }

    /// Replace the backoff strategy.
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Disable retry on errors.
    pub fn no_retry_on_error(mut self) -> Self {
        self.retry_on_error = false;
        self
    }

    /// Check if a status code should trigger a retry.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_status_range
            .as_ref()
            .is_some_and(|range| range.contains(&status))
            || self.retry_status_codes.contains(&status)
    }

    /// Calculate the delay before retry number `retry` (0-indexed).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.backoff.delay_for_attempt(retry)
    }
}

/// Backoff strategy for retries.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Constant delay between retries.
    Constant(Duration),
    /// Linear backoff: delay increases by a fixed amount.
    Linear {
        /// Delay increment per attempt.
        delay: Duration,
        /// Maximum delay.
        max: Duration,
    },
    /// Exponential backoff: delay doubles each attempt.
    Exponential {
        /// Initial delay.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier (typically 2.0).
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Linear { delay, max } => {
                let total = delay.saturating_mul(attempt.saturating_add(1));
                total.min(*max)
            }
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(attempt as i32);
                let millis = (initial.as_millis() as f64 * factor) as u64;
                Duration::from_millis(millis).min(*max)
            }
        }
    }
}

/// Retry decision used by the dispatcher.
///
/// `retries` is the number of retries already performed for the current
/// dispatch; `status` is `None` when no response was received.
pub trait RetryStrategy: Send + Sync {
    /// Check if another attempt should be made.
    fn should_retry(
        &self,
        error: Option<&HttpClientError>,
        status: Option<u16>,
        retries: u32,
    ) -> bool;

    /// Get the delay before retry number `retries` (0-indexed).
    fn retry_delay(&self, retries: u32) -> Duration;
}

impl RetryStrategy for RetryPolicy {
    fn should_retry(
        &self,
        error: Option<&HttpClientError>,
        status: Option<u16>,
        retries: u32,
    ) -> bool {
        if retries >= self.max_retries {
            return false;
        }
        let failed = error.is_some() && self.retry_on_error;
        failed || status.is_some_and(|status| self.is_retryable_status(status))
    }

    fn retry_delay(&self, retries: u32) -> Duration {
        self.delay_for_retry(retries)
    }
}
