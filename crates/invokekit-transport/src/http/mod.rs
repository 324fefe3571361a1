//! HTTP transport implementation
//!
//! Posts commands as JSON to a backend endpoint via reqwest.

mod client;

pub use client::{HttpTransport, HttpTransportConfig};
