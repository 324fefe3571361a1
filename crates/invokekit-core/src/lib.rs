#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core policy types for the invokekit command client.
//!
//! This crate holds the parts of the client that are pure functions of their
//! inputs and can be tested without a runtime:
//!
//! - **Backoff delays** via [`retry::delay_for`] with linear or exponential
//!   growth, clamped to a ceiling
//! - **Retry eligibility** via [`retry::is_retryable`] over any error
//!   implementing [`retry::RetryCode`]
//! - **Millisecond serde helpers** for configuration durations
//!
//! # Examples
//!
//! ```rust
//! use invokekit_core::prelude::*;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::builder()
//!     .max_retries(5)
//!     .base_delay(Duration::from_millis(100))
//!     .max_delay(Duration::from_millis(500))
//!     .build();
//!
//! assert_eq!(policy.delay_for(4), Duration::from_millis(500));
//! ```

pub mod retry;
pub mod serde;

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use invokekit_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::retry::{
        BackoffStrategy, PolicyError, RetryCode, RetryPolicy, RetryPolicyBuilder, delay_for,
        is_retryable,
    };
}
