//! Interceptors shipped with the client

use super::{CommandInterceptor, ResponseInterceptor};
use crate::error::ClassifiedError;
use async_trait::async_trait;
use invokekit_transport::CommandRequest;
use serde_json::Value;

/// Supplies the identity of the current caller, if any.
///
/// Implemented for any `Fn() -> Option<String>`, so a closure reading from a
/// session store works directly.
pub trait IdentitySource: Send + Sync {
    /// The current user id, or `None` when nobody is signed in.
    fn current_user(&self) -> Option<String>;
}

impl<F> IdentitySource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn current_user(&self) -> Option<String> {
        self()
    }
}

/// A fixed identity.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    /// Always report `user_id`.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self(Some(user_id.into()))
    }

    /// Never report an identity.
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentitySource for StaticIdentity {
    fn current_user(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Injects the caller's id into every command's arguments.
///
/// Writes `userId` (or a custom key), overwriting any caller-supplied value.
/// Leaves the arguments untouched when the source has no identity.
pub struct IdentityInterceptor<S> {
    source: S,
    key: String,
}

impl<S: IdentitySource> IdentityInterceptor<S> {
    /// Argument key used by default.
    pub const DEFAULT_KEY: &'static str = "userId";

    /// Inject the identity under `userId`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            key: Self::DEFAULT_KEY.to_string(),
        }
    }

    /// Inject under a different argument key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

#[async_trait]
impl<S: IdentitySource> CommandInterceptor for IdentityInterceptor<S> {
    async fn on_command(&self, request: CommandRequest) -> CommandRequest {
        match self.source.current_user() {
            Some(user_id) => request.with_arg(self.key.clone(), user_id),
            None => request,
        }
    }
}

/// Logs commands and their outcomes at `debug`.
///
/// Register it both as a command and as a response interceptor to get both
/// halves; it never alters what passes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInterceptor;

#[async_trait]
impl CommandInterceptor for TracingInterceptor {
    async fn on_command(&self, request: CommandRequest) -> CommandRequest {
        tracing::debug!(
            command = %request.name,
            arg_count = request.args.len(),
            "Dispatching command"
        );
        request
    }
}

#[async_trait]
impl ResponseInterceptor for TracingInterceptor {
    async fn on_success(&self, value: Value) -> Value {
        tracing::debug!(null_result = value.is_null(), "Command succeeded");
        value
    }

    async fn on_failure(&self, error: ClassifiedError) -> ClassifiedError {
        tracing::debug!(code = error.code(), severity = %error.severity(), error = %error, "Command failed");
        error
    }
}
