//! Interceptor pipeline for command requests and responses
//!
//! Two separate ordered lists:
//!
//! - **command interceptors** rewrite the `(name, args)` pair once, before the
//!   first transport attempt
//! - **response interceptors** see the final value or the final classified
//!   error once, after the retry loop
//!
//! Each list is folded in registration order, every hook receiving the
//! previous hook's output. The pipeline itself never skips or reorders hooks;
//! any conditional behavior belongs in the hook.

mod builtin;

pub use builtin::{IdentityInterceptor, IdentitySource, StaticIdentity, TracingInterceptor};

use crate::error::ClassifiedError;
use async_trait::async_trait;
use invokekit_transport::CommandRequest;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Hook run once per invocation before the first attempt.
#[async_trait]
pub trait CommandInterceptor: Send + Sync {
    /// Rewrite the request. Inserting an argument that already exists
    /// overwrites the caller's value.
    async fn on_command(&self, request: CommandRequest) -> CommandRequest;
}

/// Hook run once per invocation after the retry loop.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Process a successful result.
    async fn on_success(&self, value: Value) -> Value {
        value
    }

    /// Process (or replace) the final classified error.
    async fn on_failure(&self, error: ClassifiedError) -> ClassifiedError {
        error
    }
}

/// Handle returned on registration, used to eject an interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterceptorId(u64);

impl fmt::Display for InterceptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interceptor#{}", self.0)
    }
}

struct Registered<H: ?Sized> {
    id: InterceptorId,
    hook: Arc<H>,
}

impl<H: ?Sized> Clone for Registered<H> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            hook: Arc::clone(&self.hook),
        }
    }
}

/// Ordered, append-only lists of command and response interceptors.
#[derive(Clone, Default)]
pub struct InterceptorPipeline {
    next_id: u64,
    command: Vec<Registered<dyn CommandInterceptor>>,
    response: Vec<Registered<dyn ResponseInterceptor>>,
}

impl fmt::Debug for InterceptorPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorPipeline")
            .field("command", &self.command.len())
            .field("response", &self.response.len())
            .finish()
    }
}

impl InterceptorPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> InterceptorId {
        let id = InterceptorId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a command interceptor.
    pub fn use_command_interceptor<H>(&mut self, hook: H) -> InterceptorId
    where
        H: CommandInterceptor + 'static,
    {
        self.push_command(Arc::new(hook))
    }

    /// Append a shared command interceptor.
    pub fn push_command(&mut self, hook: Arc<dyn CommandInterceptor>) -> InterceptorId {
        let id = self.allocate_id();
        self.command.push(Registered { id, hook });
        id
    }

    /// Append a response interceptor.
    pub fn use_response_interceptor<H>(&mut self, hook: H) -> InterceptorId
    where
        H: ResponseInterceptor + 'static,
    {
        self.push_response(Arc::new(hook))
    }

    /// Append a shared response interceptor.
    pub fn push_response(&mut self, hook: Arc<dyn ResponseInterceptor>) -> InterceptorId {
        let id = self.allocate_id();
        self.response.push(Registered { id, hook });
        id
    }

    /// Remove an interceptor from future runs. Returns `false` if `id` is unknown.
    pub fn eject(&mut self, id: InterceptorId) -> bool {
        let before = self.command.len() + self.response.len();
        self.command.retain(|entry| entry.id != id);
        self.response.retain(|entry| entry.id != id);
        before != self.command.len() + self.response.len()
    }

    /// Number of command interceptors.
    pub fn command_len(&self) -> usize {
        self.command.len()
    }

    /// Number of response interceptors.
    pub fn response_len(&self) -> usize {
        self.response.len()
    }

    /// Whether no interceptors are registered.
    pub fn is_empty(&self) -> bool {
        self.command.is_empty() && self.response.is_empty()
    }

    /// Fold a request through every command interceptor.
    pub async fn run_command(&self, mut request: CommandRequest) -> CommandRequest {
        for entry in &self.command {
            request = entry.hook.on_command(request).await;
        }
        request
    }

    /// Fold a successful value through every response interceptor.
    pub async fn run_success(&self, mut value: Value) -> Value {
        for entry in &self.response {
            value = entry.hook.on_success(value).await;
        }
        value
    }

    /// Fold a final error through every response interceptor.
    pub async fn run_failure(&self, mut error: ClassifiedError) -> ClassifiedError {
        for entry in &self.response {
            error = entry.hook.on_failure(error).await;
        }
        error
    }
}

/// Command interceptor backed by a closure. See [`command_fn`].
pub struct FnCommandInterceptor<F>(F);

#[async_trait]
impl<F> CommandInterceptor for FnCommandInterceptor<F>
where
    F: Fn(CommandRequest) -> CommandRequest + Send + Sync,
{
    async fn on_command(&self, request: CommandRequest) -> CommandRequest {
        (self.0)(request)
    }
}

/// Wrap a closure as a command interceptor.
///
/// ```rust
/// use invokekit::interceptor::{InterceptorPipeline, command_fn};
///
/// let mut pipeline = InterceptorPipeline::new();
/// pipeline.use_command_interceptor(command_fn(|request| request.with_arg("locale", "en")));
/// ```
pub fn command_fn<F>(f: F) -> FnCommandInterceptor<F>
where
    F: Fn(CommandRequest) -> CommandRequest + Send + Sync,
{
    FnCommandInterceptor(f)
}

/// Response interceptor backed by a success closure. See [`success_fn`].
pub struct FnSuccessInterceptor<F>(F);

#[async_trait]
impl<F> ResponseInterceptor for FnSuccessInterceptor<F>
where
    F: Fn(Value) -> Value + Send + Sync,
{
    async fn on_success(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

/// Wrap a closure as a success-only response interceptor.
pub fn success_fn<F>(f: F) -> FnSuccessInterceptor<F>
where
    F: Fn(Value) -> Value + Send + Sync,
{
    FnSuccessInterceptor(f)
}

/// Response interceptor backed by a failure closure. See [`failure_fn`].
pub struct FnFailureInterceptor<F>(F);

#[async_trait]
impl<F> ResponseInterceptor for FnFailureInterceptor<F>
where
    F: Fn(ClassifiedError) -> ClassifiedError + Send + Sync,
{
    async fn on_failure(&self, error: ClassifiedError) -> ClassifiedError {
        (self.0)(error)
    }
}

/// Wrap a closure as a failure-only response interceptor.
pub fn failure_fn<F>(f: F) -> FnFailureInterceptor<F>
where
    F: Fn(ClassifiedError) -> ClassifiedError + Send + Sync,
{
    FnFailureInterceptor(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl CommandInterceptor for Recorder {
        async fn on_command(&self, request: CommandRequest) -> CommandRequest {
            self.log.lock().unwrap().push(self.tag);
            request
        }
    }

    #[async_trait]
    impl ResponseInterceptor for Recorder {
        async fn on_success(&self, value: Value) -> Value {
            self.log.lock().unwrap().push(self.tag);
            value
        }
    }

    #[tokio::test]
    async fn test_command_hooks_fold_in_registration_order() {
        let mut pipeline = InterceptorPipeline::new();
        pipeline.use_command_interceptor(command_fn(|r| r.with_arg("trail", "a")));
        pipeline.use_command_interceptor(command_fn(|r| {
            let trail = format!("{}b", r.arg("trail").and_then(Value::as_str).unwrap_or(""));
            r.with_arg("trail", trail)
        }));
        pipeline.use_command_interceptor(command_fn(|mut r| {
            r.name = format!("v2_{}", r.name);
            r
        }));

        let request = pipeline.run_command(CommandRequest::new("list")).await;

        assert_eq!(request.name, "v2_list");
        assert_eq!(request.arg("trail"), Some(&json!("ab")));
    }

    #[tokio::test]
    async fn test_response_hooks_fold_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = InterceptorPipeline::new();
        for tag in ["first", "second", "third"] {
            pipeline.use_response_interceptor(Recorder {
                tag,
                log: Arc::clone(&log),
            });
        }
        pipeline.use_response_interceptor(success_fn(|v| json!({ "wrapped": v })));

        let value = pipeline.run_success(json!(1)).await;

        assert_eq!(value, json!({ "wrapped": 1 }));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_failure_hooks_can_replace_error() {
        let mut pipeline = InterceptorPipeline::new();
        pipeline.use_response_interceptor(failure_fn(|error| {
            ClassifiedError::unknown(format!("wrapped: {}", error))
        }));
        // success-only hooks pass failures through untouched
        pipeline.use_response_interceptor(success_fn(|_| Value::Null));

        let error = pipeline
            .run_failure(ClassifiedError::system("disk full"))
            .await;

        assert_eq!(error.code(), "UNKNOWN_ERROR");
        assert_eq!(error.to_string(), "wrapped: disk full");
    }

    #[tokio::test]
    async fn test_eject_excludes_hook_from_future_runs() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = InterceptorPipeline::new();
        let keep = pipeline.use_command_interceptor(Recorder {
            tag: "keep",
            log: Arc::clone(&log),
        });
        let drop = pipeline.use_command_interceptor(Recorder {
            tag: "drop",
            log: Arc::clone(&log),
        });
        assert_ne!(keep, drop);

        assert!(pipeline.eject(drop));
        assert!(!pipeline.eject(drop));
        assert_eq!(pipeline.command_len(), 1);

        pipeline.run_command(CommandRequest::new("x")).await;
        assert_eq!(*log.lock().unwrap(), vec!["keep"]);
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = InterceptorPipeline::new();
        assert!(pipeline.is_empty());
        assert_eq!(format!("{:?}", pipeline), "InterceptorPipeline { command: 0, response: 0 }");
    }
}
