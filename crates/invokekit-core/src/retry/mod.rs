//! Backoff policy for command retries.
//!
//! Two pure building blocks with no shared state:
//!
//! - [`delay_for`] computes the wait before the next attempt
//! - [`is_retryable`] decides whether a coded error may be attempted again
//!
//! [`RetryPolicy`] bundles both with the attempt budget of a client.
//!
//! # Examples
//!
//! ```rust
//! use invokekit_core::retry::{BackoffStrategy, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::builder()
//!     .max_retries(3)
//!     .base_delay(Duration::from_millis(100))
//!     .strategy(BackoffStrategy::Exponential)
//!     .build();
//!
//! let waits: Vec<_> = (0..policy.max_retries).map(|a| policy.delay_for(a)).collect();
//! assert_eq!(
//!     waits,
//!     [100, 200, 400].map(Duration::from_millis).to_vec()
//! );
//! ```

mod policy;
mod strategy;

pub use policy::{PolicyError, RetryCode, RetryPolicy, RetryPolicyBuilder, is_retryable};
pub use strategy::{BackoffStrategy, delay_for};
