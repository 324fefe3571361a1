//! Error types for the command client
//!
//! Raw transport failures are first normalized into a [`ClassifiedError`],
//! which drives retry decisions. Whatever leaves [`CommandClient::invoke`]
//! is always a [`CommandError`]: one flat shape carrying module, code,
//! message, severity, timestamp and the cause chain.
//!
//! [`CommandClient::invoke`]: crate::CommandClient::invoke

use chrono::{DateTime, Utc};
use invokekit_core::retry::{PolicyError, RetryCode};
use invokekit_transport::{BoxError, DomainFailure, TransportError};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Result type alias for command invocations.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Stable codes surfaced on [`CommandError::code`].
pub mod codes {
    /// An attempt did not finish before the configured timeout.
    pub const TIMEOUT: &str = "TIMEOUT";
    /// Every allowed attempt failed with a retryable error.
    pub const RETRY_EXHAUSTED: &str = "RETRY_EXHAUSTED";
    /// The transport reported a system-level failure.
    pub const SYSTEM_ERROR: &str = "SYSTEM_ERROR";
    /// The failure could not be classified.
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
    /// Umbrella code when nothing more specific applies.
    pub const COMMAND_FAILED: &str = "COMMAND_FAILED";
}

/// How serious a failure is, from the caller's point of view.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; the caller can usually ignore it.
    Low,
    /// Expected business-rule rejections.
    Medium,
    /// Infrastructure failures and anything unexpected.
    High,
    /// Failures that leave the client unusable.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Normalized representation of a failed attempt.
///
/// A closed set of kinds; every kind has a fixed [`Severity`] and keeps the
/// original transport failure as its source.
#[derive(Debug, Error)]
pub enum ClassifiedError {
    /// The attempt ran out of time.
    #[error("{message}")]
    Timeout {
        /// Description of the timeout
        message: String,
        /// The raw transport failure
        #[source]
        cause: Option<TransportError>,
    },

    /// The transport failed at the system level (I/O, connection, backend down).
    #[error("{message}")]
    SystemFailure {
        /// The underlying message, preserved verbatim
        message: String,
        /// The raw transport failure
        #[source]
        cause: Option<TransportError>,
    },

    /// The backend rejected the command on purpose.
    #[error("{0}")]
    DomainFailure(DomainFailure),

    /// All allowed attempts failed with retryable errors.
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetryExhausted {
        /// Number of transport calls made
        attempts: u32,
        /// Classification of the final attempt's failure
        #[source]
        last_error: Box<ClassifiedError>,
    },

    /// Anything that could not be classified.
    #[error("{message}")]
    Unknown {
        /// Description of the failure
        message: String,
        /// The raw transport failure, if any
        #[source]
        cause: Option<TransportError>,
    },
}

impl ClassifiedError {
    /// A timeout without an underlying transport failure.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            cause: None,
        }
    }

    /// A system failure without an underlying transport failure.
    pub fn system(message: impl Into<String>) -> Self {
        Self::SystemFailure {
            message: message.into(),
            cause: None,
        }
    }

    /// An unclassified failure without an underlying transport failure.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
            cause: None,
        }
    }

    /// The stable code of this classification.
    ///
    /// Domain failures report the backend's code verbatim, which may be empty.
    pub fn code(&self) -> &str {
        match self {
            Self::Timeout { .. } => codes::TIMEOUT,
            Self::SystemFailure { .. } => codes::SYSTEM_ERROR,
            Self::DomainFailure(failure) => &failure.code,
            Self::RetryExhausted { .. } => codes::RETRY_EXHAUSTED,
            Self::Unknown { .. } => codes::UNKNOWN_ERROR,
        }
    }

    /// Severity of this classification.
    pub fn severity(&self) -> Severity {
        match self {
            Self::DomainFailure(_) => Severity::Medium,
            Self::Timeout { .. }
            | Self::SystemFailure { .. }
            | Self::RetryExhausted { .. }
            | Self::Unknown { .. } => Severity::High,
        }
    }

    /// The backend failure, if this is (or wraps) a domain failure.
    pub fn domain_failure(&self) -> Option<&DomainFailure> {
        match self {
            Self::DomainFailure(failure) => Some(failure),
            Self::RetryExhausted { last_error, .. } => last_error.domain_failure(),
            _ => None,
        }
    }

    /// The innermost classification (the last attempt's error for
    /// [`ClassifiedError::RetryExhausted`], `self` otherwise).
    pub fn root(&self) -> &ClassifiedError {
        match self {
            Self::RetryExhausted { last_error, .. } => last_error.root(),
            other => other,
        }
    }
}

impl RetryCode for ClassifiedError {
    fn code(&self) -> &str {
        ClassifiedError::code(self)
    }

    fn cause_code(&self) -> Option<&str> {
        match self {
            Self::RetryExhausted { last_error, .. } => Some(last_error.code()),
            _ => None,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}

/// The only error shape returned by the command client.
///
/// Serializes to a flat record for UI layers:
///
/// ```json
/// { "module": "command", "command": "get_accounts", "code": "RETRY_EXHAUSTED",
///   "message": "...", "severity": "high", "timestamp": "...", "cause": "..." }
/// ```
#[derive(Debug, Error, Serialize)]
#[error("{message}")]
pub struct CommandError {
    /// Module that raised the error (the client's configured module)
    pub module: String,

    /// Command that failed
    pub command: String,

    /// Stable code (see [`codes`])
    pub code: String,

    /// Human-readable message naming the command
    pub message: String,

    /// Severity
    pub severity: Severity,

    /// When the error was produced
    pub timestamp: DateTime<Utc>,

    /// The original cause
    #[source]
    #[serde(serialize_with = "serialize_cause")]
    pub cause: BoxError,
}

impl CommandError {
    /// Wrap a classified failure of `command`.
    ///
    /// The code is the classification's code, or [`codes::COMMAND_FAILED`]
    /// when classification left it empty.
    pub fn from_classified(
        module: impl Into<String>,
        command: impl Into<String>,
        error: ClassifiedError,
    ) -> Self {
        let command = command.into();
        let code = match error.code() {
            "" => codes::COMMAND_FAILED.to_string(),
            code => code.to_string(),
        };

        Self {
            module: module.into(),
            message: format!("command '{}' failed: {}", command, error),
            command,
            code,
            severity: error.severity(),
            timestamp: Utc::now(),
            cause: Box::new(error),
        }
    }

    /// A failure outside classification (e.g. an undecodable result), carrying
    /// the umbrella [`codes::COMMAND_FAILED`] code.
    pub fn command_failed(
        module: impl Into<String>,
        command: impl Into<String>,
        message: impl fmt::Display,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        let command = command.into();
        Self {
            module: module.into(),
            message: format!("command '{}' failed: {}", command, message),
            command,
            code: codes::COMMAND_FAILED.to_string(),
            severity: Severity::High,
            timestamp: Utc::now(),
            cause: Box::new(cause),
        }
    }

    /// The classification behind this error, when there is one.
    pub fn classified(&self) -> Option<&ClassifiedError> {
        self.cause.downcast_ref::<ClassifiedError>()
    }

    /// Whether the failure was transient and already retried as far as the
    /// policy allowed (`TIMEOUT`, `RETRY_EXHAUSTED`, `SYSTEM_ERROR`).
    pub fn is_transient(&self) -> bool {
        matches!(
            self.code.as_str(),
            codes::TIMEOUT | codes::RETRY_EXHAUSTED | codes::SYSTEM_ERROR
        )
    }

    /// Whether the backend rejected the command on business-rule grounds.
    pub fn is_domain(&self) -> bool {
        matches!(self.classified(), Some(ClassifiedError::DomainFailure(_)))
    }
}

fn serialize_cause<S>(cause: &BoxError, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&cause.to_string())
}

/// Errors raised while building a client from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The retry policy violates its invariants.
    #[error("invalid retry policy: {0}")]
    Policy(#[from] PolicyError),

    /// The per-attempt timeout must be positive.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    /// An environment variable held an unparseable value.
    #[error("invalid value '{value}' for {var}")]
    InvalidEnv {
        /// Variable name
        var: String,
        /// Raw value found
        value: String,
    },

    /// A client builder was finished without a transport.
    #[error("no transport configured")]
    MissingTransport,
}
