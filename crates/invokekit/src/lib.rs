//! # invokekit
//!
//! Resilient client for invoking named commands on a backend:
//! - Per-attempt timeouts with drop-based cancellation
//! - Retries with linear or exponential backoff, capped by a maximum delay
//! - Retry eligibility by error code
//! - Command and response interceptors (identity injection, tracing)
//! - One uniform, serializable error shape for every failure
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invokekit::prelude::*;
//! use invokekit_transport::HttpTransport;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = CommandClient::builder()
//!         .transport(HttpTransport::new("http://127.0.0.1:8080/commands")?)
//!         .timeout(Duration::from_secs(10))
//!         .retry(
//!             RetryPolicy::builder()
//!                 .max_retries(3)
//!                 .base_delay(Duration::from_millis(200))
//!                 .retryable_codes(["TIMEOUT", "DATABASE_LOCKED"])
//!                 .build(),
//!         )
//!         .build()?;
//!
//!     client.use_command_interceptor(IdentityInterceptor::new(StaticIdentity::new("u-1")));
//!
//!     let accounts: serde_json::Value = client.invoke("get_accounts", Args::new()).await?;
//!     println!("{accounts}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export commonly used types
pub use client::{CommandClient, CommandClientBuilder};
pub use config::ClientConfig;
pub use error::{ClassifiedError, CommandError, ConfigError, Result, Severity, codes};
pub use interceptor::{
    CommandInterceptor, IdentityInterceptor, IdentitySource, InterceptorId, InterceptorPipeline,
    ResponseInterceptor, StaticIdentity, TracingInterceptor,
};
pub use invokekit_core::retry::{BackoffStrategy, RetryPolicy};
pub use invokekit_transport::{Args, CommandRequest, Deadline, Transport, TransportError};

// Module declarations
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod observability;

// Re-export key dependencies for convenience
pub use async_trait::async_trait;
pub use serde_json::Value as JsonValue;

/// Prelude module for common imports
///
/// # Examples
///
/// ```rust
/// use invokekit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Args, BackoffStrategy, ClassifiedError, ClientConfig, CommandClient, CommandError,
        CommandInterceptor, IdentityInterceptor, ResponseInterceptor, RetryPolicy, StaticIdentity,
        TracingInterceptor,
    };
}

/// Crate version, from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
