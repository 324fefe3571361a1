//! Retry policy: attempt budget, backoff parameters and retry eligibility.

use super::strategy::{BackoffStrategy, delay_for};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Errors produced while building or validating a [`RetryPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// The base delay must be strictly positive.
    #[error("retry base delay must be greater than zero")]
    ZeroBaseDelay,

    /// A strategy name could not be parsed.
    #[error("unknown backoff strategy '{0}' (expected 'linear' or 'exponential')")]
    UnknownStrategy(String),
}

/// An error that can be matched against a set of retryable codes.
///
/// Implemented by the classified error type of the command client; kept as a
/// trait here so the policy stays free of any transport or client types.
pub trait RetryCode {
    /// The stable code assigned to this error (e.g. `TIMEOUT`).
    fn code(&self) -> &str;

    /// The code of the wrapped original cause, when there is one.
    fn cause_code(&self) -> Option<&str> {
        None
    }

    /// Human-readable message, used by the substring fallback.
    fn message(&self) -> String;
}

/// Decide whether `error` is eligible for another attempt.
///
/// - An empty `retryable_codes` set makes every error retryable.
/// - Otherwise the error's code, or the code of its cause, must be in the set.
/// - As a last resort the lowercased message is searched for each configured
///   code, lowercased with `_` replaced by a space (`DATABASE_LOCKED` matches
///   "...database locked..."). This fallback is a heuristic: it depends on the
///   wording of backend messages and can produce false positives and false
///   negatives.
///
/// # Examples
///
/// ```rust
/// use invokekit_core::retry::{RetryCode, is_retryable};
/// use std::collections::BTreeSet;
///
/// struct Failure(&'static str, &'static str);
///
/// impl RetryCode for Failure {
///     fn code(&self) -> &str { self.0 }
///     fn message(&self) -> String { self.1.to_string() }
/// }
///
/// let codes: BTreeSet<String> = ["DATABASE_LOCKED".to_string()].into();
///
/// assert!(is_retryable(&Failure("DATABASE_LOCKED", "busy"), &codes));
/// assert!(is_retryable(&Failure("SYSTEM_ERROR", "the database locked up"), &codes));
/// assert!(!is_retryable(&Failure("VALIDATION_ERROR", "amount must be positive"), &codes));
/// ```
pub fn is_retryable<E>(error: &E, retryable_codes: &BTreeSet<String>) -> bool
where
    E: RetryCode + ?Sized,
{
    if retryable_codes.is_empty() {
        return true;
    }

    if retryable_codes.contains(error.code()) {
        return true;
    }

    if let Some(cause) = error.cause_code()
        && retryable_codes.contains(cause)
    {
        return true;
    }

    let message = error.message().to_lowercase();
    retryable_codes
        .iter()
        .any(|code| message.contains(&code.to_lowercase().replace('_', " ")))
}

/// Attempt budget and backoff configuration for one client.
///
/// Deserializes from the camelCase shape used by client configuration files:
///
/// ```json
/// { "maxRetries": 3, "baseDelayMs": 1000, "strategy": "exponential",
///   "maxDelayMs": 10000, "retryableCodes": ["DATABASE_LOCKED"] }
/// ```
///
/// Every field is optional and falls back to [`RetryPolicy::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Retries after the first attempt; `n` allows `n + 1` calls in total.
    pub max_retries: u32,

    /// Base delay fed to the strategy.
    #[serde(rename = "baseDelayMs", with = "crate::serde::duration_ms")]
    pub base_delay: Duration,

    /// Growth strategy.
    pub strategy: BackoffStrategy,

    /// Ceiling applied to every computed delay.
    #[serde(rename = "maxDelayMs", with = "crate::serde::duration_ms")]
    pub max_delay: Duration,

    /// Codes eligible for retry. Empty means "retry everything".
    pub retryable_codes: BTreeSet<String>,
}

impl Default for RetryPolicy {
    /// Defaults:
    /// - `max_retries`: 3
    /// - `base_delay`: 1s
    /// - `strategy`: exponential
    /// - `max_delay`: 10s
    /// - `retryable_codes`: empty
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            strategy: BackoffStrategy::Exponential,
            max_delay: Duration::from_millis(10_000),
            retryable_codes: BTreeSet::new(),
        }
    }
}

impl RetryPolicy {
    /// Create a new builder for configuring a retry policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use invokekit_core::retry::{BackoffStrategy, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::builder()
    ///     .max_retries(5)
    ///     .base_delay(Duration::from_millis(100))
    ///     .strategy(BackoffStrategy::Linear)
    ///     .retryable_code("DATABASE_LOCKED")
    ///     .build();
    ///
    /// assert_eq!(policy.max_attempts(), 6);
    /// ```
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Check the policy invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::ZeroBaseDelay`] when `base_delay` is zero.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.base_delay.is_zero() {
            return Err(PolicyError::ZeroBaseDelay);
        }
        Ok(())
    }

    /// Total number of transport calls allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before the attempt following the (0-indexed) failed `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        delay_for(attempt, self.base_delay, self.strategy, self.max_delay)
    }

    /// Whether `error` may be retried under this policy.
    pub fn is_retryable<E>(&self, error: &E) -> bool
    where
        E: RetryCode + ?Sized,
    {
        is_retryable(error, &self.retryable_codes)
    }
}

/// Builder for [`RetryPolicy`].
///
/// Unset fields use the values of [`RetryPolicy::default`].
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    max_retries: Option<u32>,
    base_delay: Option<Duration>,
    strategy: Option<BackoffStrategy>,
    max_delay: Option<Duration>,
    retryable_codes: BTreeSet<String>,
}

impl RetryPolicyBuilder {
    /// Set the number of retries after the first attempt.
    ///
    /// Default: 3
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the base delay.
    ///
    /// Default: 1s
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    /// Set the backoff strategy.
    ///
    /// Default: [`BackoffStrategy::Exponential`]
    pub fn strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Set the delay ceiling.
    ///
    /// Default: 10s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Add one retryable code.
    pub fn retryable_code(mut self, code: impl Into<String>) -> Self {
        self.retryable_codes.insert(code.into());
        self
    }

    /// Add several retryable codes.
    pub fn retryable_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_codes
            .extend(codes.into_iter().map(Into::into));
        self
    }

    /// Build the policy. Call [`RetryPolicy::validate`] to check invariants.
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            base_delay: self.base_delay.unwrap_or(defaults.base_delay),
            strategy: self.strategy.unwrap_or(defaults.strategy),
            max_delay: self.max_delay.unwrap_or(defaults.max_delay),
            retryable_codes: self.retryable_codes,
        }
    }
}
