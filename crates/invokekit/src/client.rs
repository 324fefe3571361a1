//! The command client: interceptors, per-attempt timeout, retry and error wrapping

use std::sync::Arc;
use std::time::Duration;

use invokekit_core::retry::RetryPolicy;
use invokekit_transport::{Args, CommandRequest, Deadline, Transport, TransportError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    classify::classify,
    config::ClientConfig,
    error::{ClassifiedError, CommandError, ConfigError, Result},
    interceptor::{CommandInterceptor, InterceptorId, InterceptorPipeline, ResponseInterceptor},
    observability::{self, AttemptRecord},
};

/// Resilient client for invoking named backend commands.
///
/// Each [`invoke`](CommandClient::invoke):
///
/// 1. folds the request through the command interceptors (once)
/// 2. sends it through the transport, bounding each attempt by the configured
///    timeout and retrying retryable failures with backoff
/// 3. folds the outcome through the response interceptors (once)
/// 4. on failure, wraps the final error into a [`CommandError`]
///
/// Cloning is cheap; clones share the transport and configuration and start
/// with a copy of the interceptor lists.
///
/// # Example
///
/// ```rust,no_run
/// use invokekit::{Args, CommandClient};
/// use invokekit_transport::HttpTransport;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CommandClient::new(HttpTransport::new("http://127.0.0.1:8080/commands")?);
/// let accounts: Vec<serde_json::Value> = client.invoke("get_accounts", Args::new()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CommandClient {
    inner: Arc<ClientInner>,
    interceptors: InterceptorPipeline,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl std::fmt::Debug for CommandClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandClient")
            .field("config", &self.inner.config)
            .field("interceptors", &self.interceptors)
            .finish_non_exhaustive()
    }
}

impl CommandClient {
    /// Create a client over `transport` with the default configuration.
    pub fn new<T>(transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self::from_parts(Arc::new(transport), ClientConfig::default())
    }

    /// Create a client over `transport` with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails [`ClientConfig::validate`].
    pub fn with_config<T>(transport: T, config: ClientConfig) -> std::result::Result<Self, ConfigError>
    where
        T: Transport + 'static,
    {
        config.validate()?;
        Ok(Self::from_parts(Arc::new(transport), config))
    }

    /// Create a client builder for advanced configuration.
    pub fn builder() -> CommandClientBuilder {
        CommandClientBuilder::default()
    }

    fn from_parts(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner { transport, config }),
            interceptors: InterceptorPipeline::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The registered interceptors.
    pub fn interceptors(&self) -> &InterceptorPipeline {
        &self.interceptors
    }

    /// Append a command interceptor; it runs after those already registered.
    pub fn use_command_interceptor<H>(&mut self, hook: H) -> InterceptorId
    where
        H: CommandInterceptor + 'static,
    {
        self.interceptors.use_command_interceptor(hook)
    }

    /// Append a response interceptor; it runs after those already registered.
    pub fn use_response_interceptor<H>(&mut self, hook: H) -> InterceptorId
    where
        H: ResponseInterceptor + 'static,
    {
        self.interceptors.use_response_interceptor(hook)
    }

    /// Remove a previously registered interceptor.
    pub fn eject_interceptor(&mut self, id: InterceptorId) -> bool {
        self.interceptors.eject(id)
    }

    /// Invoke `name` with `args` and decode the result into `T`.
    ///
    /// # Errors
    ///
    /// Every failure is a [`CommandError`]; see [`codes`](crate::codes) for the
    /// possible codes. A result that does not decode into `T` fails with
    /// `COMMAND_FAILED`.
    pub async fn invoke<T>(&self, name: impl Into<String>, args: Args) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = CommandRequest::new(name).with_args(args);
        let span = invoke_span(&request.name);

        async move {
            let (command, value) = self.run(request).await?;
            serde_json::from_value(value).map_err(|e| {
                self.report(CommandError::command_failed(
                    &self.inner.config.module,
                    command,
                    "result could not be decoded",
                    e,
                ))
            })
        }
        .instrument(span)
        .await
    }

    /// Invoke `name` with `args` and return the raw JSON result.
    ///
    /// # Errors
    ///
    /// Same as [`invoke`](CommandClient::invoke), minus decoding.
    pub async fn invoke_raw(&self, name: impl Into<String>, args: Args) -> Result<Value> {
        let request = CommandRequest::new(name).with_args(args);
        let span = invoke_span(&request.name);

        async move { self.run(request).await.map(|(_, value)| value) }
            .instrument(span)
            .await
    }

    /// One full invocation; returns the effective command name with the value.
    async fn run(&self, request: CommandRequest) -> Result<(String, Value)> {
        let request = self.interceptors.run_command(request).await;

        match self.execute_with_retry(&request).await {
            Ok(value) => {
                let value = self.interceptors.run_success(value).await;
                Ok((request.name, value))
            }
            Err(error) => {
                let error = self.interceptors.run_failure(error).await;
                Err(self.report(CommandError::from_classified(
                    &self.inner.config.module,
                    request.name,
                    error,
                )))
            }
        }
    }

    async fn execute_with_retry(
        &self,
        request: &CommandRequest,
    ) -> std::result::Result<Value, ClassifiedError> {
        let policy: &RetryPolicy = &self.inner.config.retry;
        let max_attempts = policy.max_attempts();
        let mut attempt = 0u32;

        loop {
            let record = AttemptRecord::start(attempt, max_attempts);

            let error = match self.attempt_once(request).await {
                Ok(value) => {
                    record.log_success();
                    return Ok(value);
                }
                Err(raw) => classify(raw),
            };

            let retryable = policy.is_retryable(&error);
            record.log_failure(&error, retryable);

            if !retryable {
                return Err(error);
            }

            if record.is_last() {
                return Err(ClassifiedError::RetryExhausted {
                    attempts: attempt.saturating_add(1),
                    last_error: Box::new(error),
                });
            }

            let delay = policy.delay_for(attempt);
            observability::log_backoff(delay, attempt + 1);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Race one transport attempt against the per-attempt timeout.
    ///
    /// On expiry the attempt future is dropped; work already handed to the
    /// backend is not recalled.
    async fn attempt_once(&self, request: &CommandRequest) -> std::result::Result<Value, TransportError> {
        let timeout = self.inner.config.timeout;
        let deadline = Deadline::after(timeout);

        match tokio::time::timeout_at(
            deadline.expires_at(),
            self.inner.transport.attempt(request, deadline),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::timed_out(timeout)),
        }
    }

    fn report(&self, error: CommandError) -> CommandError {
        observability::log_command_error(&error);
        error
    }
}

fn invoke_span(command: &str) -> tracing::Span {
    tracing::info_span!("invoke", command = %command, invocation_id = %Uuid::new_v4())
}

/// Builder for a configured [`CommandClient`].
#[derive(Default)]
pub struct CommandClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    config: ClientConfig,
    interceptors: InterceptorPipeline,
}

impl CommandClientBuilder {
    /// Set the transport.
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set a transport shared with other clients.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the maximum number of retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.retry.max_retries = max_retries;
        self
    }

    /// Set the module name reported on errors.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.config.module = module.into();
        self
    }

    /// Register a command interceptor.
    pub fn command_interceptor<H>(mut self, hook: H) -> Self
    where
        H: CommandInterceptor + 'static,
    {
        self.interceptors.use_command_interceptor(hook);
        self
    }

    /// Register a response interceptor.
    pub fn response_interceptor<H>(mut self, hook: H) -> Self
    where
        H: ResponseInterceptor + 'static,
    {
        self.interceptors.use_response_interceptor(hook);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingTransport`] when no transport was set, or
    /// any error [`ClientConfig::validate`] reports.
    pub fn build(self) -> std::result::Result<CommandClient, ConfigError> {
        let transport = self.transport.ok_or(ConfigError::MissingTransport)?;
        self.config.validate()?;

        Ok(CommandClient {
            inner: Arc::new(ClientInner {
                transport,
                config: self.config,
            }),
            interceptors: self.interceptors,
        })
    }
}
