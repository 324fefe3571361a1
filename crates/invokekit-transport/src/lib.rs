//! Transport boundary for the invokekit command client
//!
//! A transport performs one attempt of a named command and reports either the
//! raw JSON result or a raw failure. The client layered on top owns timeouts,
//! retries, classification and interceptors.
//!
//! # Architecture
//!
//! - **Transport trait**: one attempt of one command, bounded by a [`Deadline`]
//! - **Raw failures**: [`TransportError`] separates backend-raised domain
//!   failures from system failures and unclassified errors
//! - **HTTP transport**: posts commands to a backend via reqwest
//!
//! # Usage
//!
//! ```rust,no_run
//! use invokekit_transport::{CommandRequest, Deadline, HttpTransport, Transport};
//! use std::time::Duration;
//!
//! # async fn example() -> invokekit_transport::Result<()> {
//! let transport = HttpTransport::new("http://127.0.0.1:8080")?;
//! let request = CommandRequest::new("get_accounts");
//! let value = transport.attempt(&request, Deadline::after(Duration::from_secs(5))).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod traits;

// Re-export commonly used types
pub use error::{BoxError, DomainFailure, Result, TransportError};
pub use http::{HttpTransport, HttpTransportConfig};
pub use traits::{Args, CommandRequest, Deadline, Transport};
