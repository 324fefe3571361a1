//! Structured logging for command invocations
//!
//! Every invocation runs inside an `invoke` span carrying the command name and
//! an invocation id; the helpers here emit the per-attempt events inside it.

use crate::error::{ClassifiedError, CommandError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Bookkeeping for a single attempt
#[derive(Debug, Clone, Copy)]
pub struct AttemptRecord {
    /// 0-indexed attempt number
    pub index: u32,
    /// Total attempts the policy allows
    pub max_attempts: u32,
    /// When the attempt started
    pub started_at: Instant,
}

impl AttemptRecord {
    /// Record the start of attempt `index`
    pub fn start(index: u32, max_attempts: u32) -> Self {
        let record = Self {
            index,
            max_attempts,
            started_at: Instant::now(),
        };
        debug!(
            attempt = index + 1,
            max_attempts, "Sending command attempt"
        );
        record
    }

    /// Time since the attempt started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether this is the last attempt the policy allows
    pub fn is_last(&self) -> bool {
        self.index.saturating_add(1) >= self.max_attempts
    }

    /// Log a successful attempt. Success after earlier failures is logged at `info`.
    pub fn log_success(&self) {
        if self.index > 0 {
            info!(
                attempt = self.index + 1,
                retries = self.index,
                elapsed_ms = self.elapsed().as_millis(),
                "Command recovered after retry"
            );
        } else {
            debug!(elapsed_ms = self.elapsed().as_millis(), "Command attempt succeeded");
        }
    }

    /// Log a failed attempt
    pub fn log_failure(&self, error: &ClassifiedError, retryable: bool) {
        if retryable && !self.is_last() {
            warn!(
                attempt = self.index + 1,
                max_attempts = self.max_attempts,
                elapsed_ms = self.elapsed().as_millis(),
                code = error.code(),
                error = %error,
                "Command attempt failed, will retry"
            );
        } else {
            debug!(
                attempt = self.index + 1,
                max_attempts = self.max_attempts,
                elapsed_ms = self.elapsed().as_millis(),
                code = error.code(),
                retryable,
                "Command attempt failed, giving up"
            );
        }
    }
}

/// Log the wait before the next attempt
pub fn log_backoff(delay: Duration, next_attempt: u32) {
    debug!(
        delay_ms = delay.as_millis(),
        next_attempt = next_attempt + 1,
        "Backing off before retry"
    );
}

/// Log the error handed back to the caller
pub fn log_command_error(error: &CommandError) {
    error!(
        module = %error.module,
        command = %error.command,
        code = %error.code,
        severity = %error.severity,
        error = %error,
        "Command failed"
    );
}

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "trace")]
#[cfg_attr(docsrs, doc(cfg(feature = "trace")))]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
