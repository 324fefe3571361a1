//! Loading client configuration from the environment

#![cfg(feature = "env")]

use assert_matches::assert_matches;
use invokekit::{BackoffStrategy, ClientConfig, ConfigError};
use invokekit_core::retry::PolicyError;
use std::time::Duration;

const VARS: [&str; 7] = [
    "INVOKEKIT_TIMEOUT_MS",
    "INVOKEKIT_MAX_RETRIES",
    "INVOKEKIT_BASE_DELAY_MS",
    "INVOKEKIT_MAX_DELAY_MS",
    "INVOKEKIT_BACKOFF",
    "INVOKEKIT_RETRYABLE_CODES",
    "INVOKEKIT_MODULE",
];

/// Run `f` with exactly `set` defined among the client variables
fn with_env<R>(set: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let vars: Vec<(&str, Option<&str>)> = VARS
        .iter()
        .map(|name| {
            let value = set.iter().find(|(k, _)| k == name).map(|(_, v)| *v);
            (*name, value)
        })
        .collect();
    temp_env::with_vars(vars, f)
}

#[test]
fn test_from_env_defaults() {
    let config = with_env(&[], ClientConfig::from_env).unwrap();
    assert_eq!(config, ClientConfig::default());
}

#[test]
fn test_from_env_reads_all_variables() {
    let config = with_env(
        &[
            ("INVOKEKIT_TIMEOUT_MS", "2500"),
            ("INVOKEKIT_MAX_RETRIES", "5"),
            ("INVOKEKIT_BASE_DELAY_MS", "50"),
            ("INVOKEKIT_MAX_DELAY_MS", "800"),
            ("INVOKEKIT_BACKOFF", "Linear"),
            ("INVOKEKIT_RETRYABLE_CODES", "DATABASE_LOCKED, TIMEOUT,,"),
            ("INVOKEKIT_MODULE", "transactions"),
        ],
        ClientConfig::from_env,
    )
    .unwrap();

    assert_eq!(config.timeout, Duration::from_millis(2500));
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry.base_delay, Duration::from_millis(50));
    assert_eq!(config.retry.max_delay, Duration::from_millis(800));
    assert_eq!(config.retry.strategy, BackoffStrategy::Linear);
    assert_eq!(
        config.retry.retryable_codes.iter().collect::<Vec<_>>(),
        vec!["DATABASE_LOCKED", "TIMEOUT"]
    );
    assert_eq!(config.module, "transactions");
}

#[test]
fn test_from_env_rejects_unparseable_values() {
    let err = with_env(&[("INVOKEKIT_MAX_RETRIES", "many")], ClientConfig::from_env).unwrap_err();
    assert_matches!(err, ConfigError::InvalidEnv { ref var, ref value }
        if var == "INVOKEKIT_MAX_RETRIES" && value == "many");

    let err = with_env(&[("INVOKEKIT_BACKOFF", "fibonacci")], ClientConfig::from_env).unwrap_err();
    assert_matches!(err, ConfigError::InvalidEnv { ref var, .. } if var == "INVOKEKIT_BACKOFF");
}

#[test]
fn test_from_env_validates_result() {
    let err = with_env(&[("INVOKEKIT_BASE_DELAY_MS", "0")], ClientConfig::from_env).unwrap_err();
    assert_matches!(err, ConfigError::Policy(PolicyError::ZeroBaseDelay));

    let err = with_env(&[("INVOKEKIT_TIMEOUT_MS", "0")], ClientConfig::from_env).unwrap_err();
    assert_matches!(err, ConfigError::ZeroTimeout);
}
