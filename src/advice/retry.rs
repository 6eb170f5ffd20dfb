//! Retry advice: re-invoke failed calls with exponential backoff.
//!
//! Uses `backon` for exponential backoff with jitter. The advice is an
//! around hook, so each attempt re-enters the remaining advice layers and
//! the original member with the same arguments.

use std::time::Duration;

use backon::{BlockingRetryable, ExponentialBuilder};
use serde::Deserialize;
use tracing::warn;

use crate::aspect::Aspect;
use crate::error::Fault;

/// Backoff settings for retry advice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry, in milliseconds.
    pub min_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Maximum number of retries after the first attempt.
    pub max_times: usize,
    /// Randomize delays.
    pub jitter: bool,
    /// Fault kinds worth retrying. Empty retries every fault.
    pub retry_on: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 10,
            max_delay_ms: 2_000,
            max_times: 3,
            jitter: true,
            retry_on: Vec::new(),
        }
    }
}

impl RetryConfig {
    /// Restrict retries to faults of the given kinds.
    pub fn retry_on<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retry_on = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_times(mut self, max_times: usize) -> Self {
        self.max_times = max_times;
        self
    }

    /// Backoff builder described by this config.
    pub fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_max_times(self.max_times);
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }

    /// Returns true if `fault` should be retried.
    pub fn is_retryable(&self, fault: &Fault) -> bool {
        self.retry_on.is_empty() || self.retry_on.iter().any(|kind| fault.is(kind))
    }
}

/// Aspect that retries failed calls according to `config`.
///
/// The last fault is returned once retries are exhausted, or immediately
/// for faults `config` does not consider retryable.
pub fn retry<T: 'static>(config: RetryConfig) -> Aspect<T> {
    Aspect::around_only(move |next, ctx, args| {
        let member = next.member().clone();
        (|| next.proceed(ctx, args.clone()))
            .retry(config.backoff())
            .sleep(std::thread::sleep)
            .when(|fault: &Fault| config.is_retryable(fault))
            .notify(|fault: &Fault, dur: Duration| {
                warn!(member = %member, error = %fault, delay = ?dur, "Call failed, retrying");
            })
            .call()
    })
}
