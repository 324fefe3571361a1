//! Backoff strategies and the delay calculation shared by every retry loop.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How the wait between two attempts grows.
///
/// Both strategies are deterministic: there is no jitter, so a given
/// attempt index always produces the same delay.
///
/// # Examples
///
/// ```rust
/// use invokekit_core::retry::{BackoffStrategy, delay_for};
/// use std::time::Duration;
///
/// let base = Duration::from_millis(100);
/// let max = Duration::from_secs(10);
///
/// assert_eq!(delay_for(2, base, BackoffStrategy::Exponential, max), Duration::from_millis(400));
/// assert_eq!(delay_for(2, base, BackoffStrategy::Linear, max), Duration::from_millis(300));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// `base * (attempt + 1)`
    Linear,

    /// `base * 2^attempt`
    #[default]
    Exponential,
}

impl BackoffStrategy {
    /// Multiplier applied to the base delay for the given attempt index.
    ///
    /// Saturates at `u32::MAX` instead of overflowing.
    pub fn factor(self, attempt: u32) -> u32 {
        match self {
            BackoffStrategy::Linear => attempt.saturating_add(1),
            BackoffStrategy::Exponential => 2u32.checked_pow(attempt).unwrap_or(u32::MAX),
        }
    }
}

impl fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackoffStrategy::Linear => write!(f, "linear"),
            BackoffStrategy::Exponential => write!(f, "exponential"),
        }
    }
}

impl FromStr for BackoffStrategy {
    type Err = super::PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(BackoffStrategy::Linear),
            "exponential" => Ok(BackoffStrategy::Exponential),
            other => Err(super::PolicyError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Compute the wait inserted before the next attempt.
///
/// `attempt` is the 0-indexed number of the attempt that just failed, so
/// `delay_for(0, ..)` is the wait before the *second* call. The result never
/// exceeds `max_delay`.
pub fn delay_for(
    attempt: u32,
    base_delay: Duration,
    strategy: BackoffStrategy,
    max_delay: Duration,
) -> Duration {
    base_delay
        .saturating_mul(strategy.factor(attempt))
        .min(max_delay)
}
