//! Example showing retries, identity injection and the uniform error shape
//!
//! Uses an in-memory ledger backend that reports `DATABASE_LOCKED` on the
//! first call of every command, so no server is required.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example basic --features trace
//! ```

use async_trait::async_trait;
use invokekit::observability::init_tracing;
use invokekit::{Args, CommandClient, IdentityInterceptor, RetryPolicy, StaticIdentity, TracingInterceptor};
use invokekit_transport::{CommandRequest, Deadline, DomainFailure, Transport, TransportError};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct LockyLedger {
    seen: Mutex<HashSet<String>>,
}

#[async_trait]
impl Transport for LockyLedger {
    async fn attempt(
        &self,
        request: &CommandRequest,
        _deadline: Deadline,
    ) -> invokekit_transport::Result<Value> {
        let first_call = self
            .seen
            .lock()
            .map_err(|_| TransportError::system("ledger state poisoned"))?
            .insert(request.name.clone());
        if first_call {
            return Err(DomainFailure::new("DATABASE_LOCKED", "ledger is being written")
                .with_module("ledger")
                .into());
        }

        match request.name.as_str() {
            "get_accounts" => Ok(json!([
                {"id": 1, "name": "Checking", "owner": request.arg("userId")},
                {"id": 2, "name": "Savings", "owner": request.arg("userId")},
            ])),
            "create_transaction" => Err(DomainFailure::new(
                "VALIDATION_ERROR",
                "amount must be positive",
            )
            .with_category("validation")
            .with_module("transactions")
            .into()),
            other => Err(TransportError::system(format!("unknown command '{other}'"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Account {
    id: u64,
    name: String,
    owner: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut client = CommandClient::builder()
        .transport(LockyLedger::default())
        .timeout(Duration::from_secs(5))
        .retry(
            RetryPolicy::builder()
                .max_retries(2)
                .base_delay(Duration::from_millis(100))
                .retryable_codes(["DATABASE_LOCKED", "TIMEOUT"])
                .build(),
        )
        .module("ledger")
        .build()?;

    client.use_command_interceptor(IdentityInterceptor::new(StaticIdentity::new("u-42")));
    client.use_command_interceptor(TracingInterceptor);
    client.use_response_interceptor(TracingInterceptor);

    let accounts: Vec<Account> = client.invoke("get_accounts", Args::new()).await?;
    for account in &accounts {
        println!("#{} {} (owner: {:?})", account.id, account.name, account.owner);
    }

    let mut args = Args::new();
    args.insert("amount".into(), json!(-5));
    match client.invoke_raw("create_transaction", args).await {
        Ok(value) => println!("unexpected success: {value}"),
        Err(err) => println!("{}", serde_json::to_string_pretty(&err)?),
    }

    Ok(())
}
