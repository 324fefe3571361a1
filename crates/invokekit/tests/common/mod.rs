//! Common test utilities and helpers

use async_trait::async_trait;
use invokekit::{Args, CommandRequest, Deadline, Transport, TransportError};
use invokekit_transport::DomainFailure;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// One scripted transport outcome
#[allow(dead_code)]
pub enum Step {
    Ok(Value),
    Fail(TransportError),
    /// Never completes; only the client's timer ends the attempt
    Hang,
}

/// What the transport saw on one call
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Call {
    pub request: CommandRequest,
    pub at: Instant,
    pub deadline: Deadline,
}

type Fallback = Box<dyn Fn() -> TransportError + Send + Sync>;

/// Transport that replays a queue of outcomes and records every call
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    fallback: Option<Fallback>,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call not covered by the queue with `make()`
    pub fn failing_with(make: impl Fn() -> TransportError + Send + Sync + 'static) -> Self {
        Self {
            fallback: Some(Box::new(make)),
            ..Self::default()
        }
    }

    pub fn then_ok(self, value: Value) -> Self {
        self.push(Step::Ok(value))
    }

    pub fn then_fail(self, error: TransportError) -> Self {
        self.push(Step::Fail(error))
    }

    pub fn then_hang(self) -> Self {
        self.push(Step::Hang)
    }

    fn push(self, step: Step) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Waits between consecutive calls
    pub fn gaps(&self) -> Vec<Duration> {
        self.calls()
            .windows(2)
            .map(|pair| pair[1].at.duration_since(pair[0].at))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn attempt(
        &self,
        request: &CommandRequest,
        deadline: Deadline,
    ) -> invokekit_transport::Result<Value> {
        self.calls.lock().unwrap().push(Call {
            request: request.clone(),
            at: Instant::now(),
            deadline,
        });

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Ok(value)) => Ok(value),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Hang) => std::future::pending().await,
            None => match &self.fallback {
                Some(make) => Err(make()),
                None => Ok(Value::Null),
            },
        }
    }
}

/// A domain failure with `code`
#[allow(dead_code)]
pub fn domain(code: &str) -> TransportError {
    TransportError::Domain(
        DomainFailure::new(code, format!("{} raised by backend", code.to_lowercase()))
            .with_category("backend")
            .with_module("transactions"),
    )
}

/// Build an argument map from a JSON object literal
#[allow(dead_code)]
pub fn args(value: Value) -> Args {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Shorthand for a millisecond duration
#[allow(dead_code)]
pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
