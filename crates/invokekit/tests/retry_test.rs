//! Retry loop, backoff timing and per-attempt timeouts
//!
//! All tests run on a paused tokio clock, so backoff waits are measured
//! exactly without slowing the suite down.

mod common;

use assert_matches::assert_matches;
use common::{ScriptedTransport, domain, ms};
use invokekit::{
    Args, BackoffStrategy, ClassifiedError, ClientConfig, CommandClient, RetryPolicy, Severity,
    TransportError, codes, interceptor::failure_fn,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(max_retries)
        .base_delay(ms(100))
        .retryable_codes(["DATABASE_LOCKED", "TIMEOUT"])
        .build()
}

fn client(transport: &Arc<ScriptedTransport>, retry: RetryPolicy) -> CommandClient {
    CommandClient::builder()
        .shared_transport(transport.clone())
        .timeout(ms(50))
        .retry(retry)
        .build()
        .unwrap()
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
#[tokio::test(start_paused = true)]
async fn test_retryable_failures_exhaust_budget(#[case] max_retries: u32) {
    let transport = ScriptedTransport::failing_with(|| domain("DATABASE_LOCKED")).shared();
    let client = client(&transport, policy(max_retries));

    let err = client
        .invoke_raw("create_transaction", Args::new())
        .await
        .unwrap_err();

    assert_eq!(transport.call_count(), max_retries as usize + 1);
    assert_eq!(err.code, codes::RETRY_EXHAUSTED);
    assert_eq!(err.severity, Severity::High);
    assert!(err.is_transient());
    assert_matches!(
        err.classified(),
        Some(ClassifiedError::RetryExhausted { attempts, last_error })
            if *attempts == max_retries + 1 && last_error.code() == "DATABASE_LOCKED"
    );
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_error_fails_immediately() {
    let transport = ScriptedTransport::failing_with(|| domain("VALIDATION_ERROR")).shared();
    let client = client(&transport, policy(3));

    let err = client
        .invoke_raw("create_transaction", Args::new())
        .await
        .unwrap_err();

    assert_eq!(transport.call_count(), 1);
    assert_eq!(err.code, "VALIDATION_ERROR");
    assert_eq!(err.severity, Severity::Medium);
    assert_eq!(err.module, "command");
    assert_eq!(err.command, "create_transaction");
    assert!(err.message.contains("create_transaction"));
    assert!(err.is_domain());
}

#[rstest]
#[case::exponential(BackoffStrategy::Exponential, 3, Duration::from_secs(10), vec![100, 200, 400])]
#[case::linear(BackoffStrategy::Linear, 3, Duration::from_secs(10), vec![100, 200, 300])]
#[case::clamped(BackoffStrategy::Exponential, 5, ms(500), vec![100, 200, 400, 500, 500])]
#[tokio::test(start_paused = true)]
async fn test_backoff_waits_between_attempts(
    #[case] strategy: BackoffStrategy,
    #[case] max_retries: u32,
    #[case] max_delay: Duration,
    #[case] expected_ms: Vec<u64>,
) {
    let transport = ScriptedTransport::failing_with(|| domain("DATABASE_LOCKED")).shared();
    let retry = RetryPolicy::builder()
        .max_retries(max_retries)
        .base_delay(ms(100))
        .strategy(strategy)
        .max_delay(max_delay)
        .build();
    let client = client(&transport, retry);

    let _ = client.invoke_raw("sync", Args::new()).await;

    let expected: Vec<Duration> = expected_ms.into_iter().map(ms).collect();
    assert_eq!(transport.gaps(), expected);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failures() {
    let transport = ScriptedTransport::new()
        .then_fail(domain("DATABASE_LOCKED"))
        .then_fail(TransportError::system("connection timed out"))
        .then_ok(json!({"id": 7}))
        .shared();
    let client = client(&transport, policy(3));

    let value = client.invoke_raw("create_account", Args::new()).await.unwrap();

    assert_eq!(value, json!({"id": 7}));
    assert_eq!(transport.call_count(), 3);
    assert_eq!(transport.gaps(), vec![ms(100), ms(200)]);
}

#[tokio::test(start_paused = true)]
async fn test_hung_attempt_is_a_timeout() {
    let transport = ScriptedTransport::new().then_hang().shared();
    let retry = RetryPolicy::builder()
        .max_retries(2)
        .retryable_code("DATABASE_LOCKED")
        .build();
    let client = client(&transport, retry);

    let err = client.invoke_raw("slow_report", Args::new()).await.unwrap_err();

    assert_eq!(transport.call_count(), 1);
    assert_eq!(err.code, codes::TIMEOUT);
    assert_eq!(err.severity, Severity::High);
    assert!(err.to_string().contains("50ms"), "got: {err}");

    let call = &transport.calls()[0];
    assert_eq!(call.deadline.timeout(), ms(50));
    assert_eq!(call.deadline.expires_at(), call.at + ms(50));
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_attempt_is_retried() {
    let transport = ScriptedTransport::new()
        .then_hang()
        .then_ok(json!("done"))
        .shared();
    let client = client(&transport, policy(1));

    let value = client.invoke_raw("slow_report", Args::new()).await.unwrap();

    assert_eq!(value, json!("done"));
    // 50ms timeout plus the first backoff
    assert_eq!(transport.gaps(), vec![ms(150)]);
}

#[tokio::test(start_paused = true)]
async fn test_message_fallback_matches_code() {
    let transport =
        ScriptedTransport::failing_with(|| TransportError::system("Database locked by writer"))
            .shared();
    let retry = RetryPolicy::builder()
        .max_retries(2)
        .base_delay(ms(10))
        .retryable_code("DATABASE_LOCKED")
        .build();
    let client = client(&transport, retry);

    let err = client.invoke_raw("sync", Args::new()).await.unwrap_err();

    assert_eq!(transport.call_count(), 3);
    assert_eq!(err.code, codes::RETRY_EXHAUSTED);
    assert_eq!(err.classified().unwrap().root().code(), codes::SYSTEM_ERROR);
}

#[tokio::test(start_paused = true)]
async fn test_empty_code_set_retries_everything() {
    let transport = ScriptedTransport::new()
        .then_fail(domain("VALIDATION_ERROR"))
        .then_fail(TransportError::Other(anyhow::anyhow!("garbled frame")))
        .then_ok(json!(true))
        .shared();
    let retry = RetryPolicy::builder()
        .max_retries(2)
        .base_delay(ms(10))
        .build();
    let client = client(&transport, retry);

    let value = client.invoke_raw("ping", Args::new()).await.unwrap();

    assert_eq!(value, json!(true));
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failure_hooks_run_once_after_retries() {
    let transport = ScriptedTransport::failing_with(|| domain("DATABASE_LOCKED")).shared();
    let seen = Arc::new(AtomicUsize::new(0));

    let mut client = client(&transport, policy(2));
    let counter = Arc::clone(&seen);
    client.use_response_interceptor(failure_fn(move |error| {
        counter.fetch_add(1, Ordering::SeqCst);
        error
    }));

    let err = client.invoke_raw("sync", Args::new()).await.unwrap_err();

    assert_eq!(transport.call_count(), 3);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(err.code, codes::RETRY_EXHAUSTED);
}

#[tokio::test(start_paused = true)]
async fn test_default_config_attempts() {
    let transport = ScriptedTransport::failing_with(|| TransportError::system("disk full")).shared();
    let client = CommandClient::with_config(
        transport.clone(),
        ClientConfig::default().with_module("ledger"),
    )
    .unwrap();

    let err = client.invoke_raw("sync", Args::new()).await.unwrap_err();

    // 3 retries, exponential from 1s
    assert_eq!(transport.call_count(), 4);
    assert_eq!(
        transport.gaps(),
        vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert_eq!(err.module, "ledger");
}
