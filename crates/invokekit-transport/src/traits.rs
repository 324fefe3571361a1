//! Transport trait and the request types it consumes
//!
//! A [`Transport`] performs exactly one attempt of a command call. Retrying,
//! timeouts and error classification live in the client; a transport only
//! reports what happened.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Named command arguments
pub type Args = serde_json::Map<String, Value>;

/// A command invocation: a name plus its arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandRequest {
    /// Command name (e.g. `get_accounts`)
    pub name: String,

    /// Command arguments
    pub args: Args,
}

impl CommandRequest {
    /// Create a request with no arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Args::new(),
        }
    }

    /// Replace all arguments
    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Set one argument, overwriting any existing value under the same key
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Get an argument by key
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }
}

/// The point in time by which an attempt has to finish.
///
/// Handed to every [`Transport::attempt`] so implementations can bound their
/// own work (socket timeouts, backend deadlines). The client enforces the
/// same deadline independently by racing the attempt against a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    timeout: Duration,
    expires_at: Instant,
}

impl Deadline {
    /// A deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self {
            timeout,
            expires_at: Instant::now() + timeout,
        }
    }

    /// The full timeout this deadline was created with
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// When the deadline expires
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Time left before expiry (zero once expired)
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// Performs one attempt of a command call.
///
/// Implementations return the raw JSON result on success, or one of the
/// [`TransportError`](crate::TransportError) variants:
///
/// - `Domain` when the backend rejected the command on purpose
/// - `System` when the call itself failed (I/O, connection, timeout)
/// - `Other` for anything else
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` once, finishing before `deadline` if possible
    async fn attempt(&self, request: &CommandRequest, deadline: Deadline) -> Result<Value>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn attempt(&self, request: &CommandRequest, deadline: Deadline) -> Result<Value> {
        (**self).attempt(request, deadline).await
    }
}
