//! Configuration for the command client

use crate::error::ConfigError;
use invokekit_core::retry::{BackoffStrategy, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Module name reported on errors when none is configured.
pub const DEFAULT_MODULE: &str = "command";

/// Configuration for a [`CommandClient`](crate::CommandClient).
///
/// Serializes in the camelCase shape used by front-end settings files:
///
/// ```json
/// { "timeoutMs": 30000, "module": "command",
///   "retry": { "maxRetries": 3, "baseDelayMs": 1000, "strategy": "exponential",
///              "maxDelayMs": 10000, "retryableCodes": [] } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Upper bound on each individual attempt
    #[serde(rename = "timeoutMs", with = "invokekit_core::serde::duration_ms")]
    pub timeout: Duration,

    /// Retry and backoff policy
    pub retry: RetryPolicy,

    /// Module name stamped on every [`CommandError`](crate::CommandError)
    pub module: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            module: DEFAULT_MODULE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// Set the module name reported on errors.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] for a zero timeout and
    /// [`ConfigError::Policy`] when the retry policy is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.retry.validate()?;
        Ok(())
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    /// Unset variables keep their defaults:
    /// - `INVOKEKIT_TIMEOUT_MS` for the per-attempt timeout
    /// - `INVOKEKIT_MAX_RETRIES` for the retry budget
    /// - `INVOKEKIT_BASE_DELAY_MS` / `INVOKEKIT_MAX_DELAY_MS` for backoff bounds
    /// - `INVOKEKIT_BACKOFF` for the strategy (`linear` or `exponential`)
    /// - `INVOKEKIT_RETRYABLE_CODES` for a comma separated code list
    /// - `INVOKEKIT_MODULE` for the module name
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] for a value that does not parse,
    /// and any error [`ClientConfig::validate`] reports.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self, ConfigError> {
        use std::env;

        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>("INVOKEKIT_TIMEOUT_MS")? {
            config.timeout = Duration::from_millis(ms);
        }

        if let Some(max_retries) = parse_var::<u32>("INVOKEKIT_MAX_RETRIES")? {
            config.retry.max_retries = max_retries;
        }

        if let Some(ms) = parse_var::<u64>("INVOKEKIT_BASE_DELAY_MS")? {
            config.retry.base_delay = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_var::<u64>("INVOKEKIT_MAX_DELAY_MS")? {
            config.retry.max_delay = Duration::from_millis(ms);
        }

        if let Some(strategy) = parse_var::<BackoffStrategy>("INVOKEKIT_BACKOFF")? {
            config.retry.strategy = strategy;
        }

        if let Ok(codes) = env::var("INVOKEKIT_RETRYABLE_CODES") {
            config.retry.retryable_codes = codes
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(module) = env::var("INVOKEKIT_MODULE")
            && !module.trim().is_empty()
        {
            config.module = module.trim().to_string();
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "env")]
fn parse_var<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
