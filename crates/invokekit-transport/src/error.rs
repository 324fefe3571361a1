//! Raw failures reported by a transport attempt

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Boxed error used as the optional cause of a system failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error the backend raised on purpose to reject a command.
///
/// All fields are carried verbatim from the backend; the client never
/// rewrites them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainFailure {
    /// Backend-assigned error code (e.g. `VALIDATION_ERROR`)
    pub code: String,

    /// Human-readable description
    pub description: String,

    /// Error category (e.g. `validation`, `database`)
    #[serde(default)]
    pub category: String,

    /// Backend module that raised the error
    #[serde(default)]
    pub module: String,

    /// Optional structured details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl DomainFailure {
    /// Create a domain failure with a code and description
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            category: String::new(),
            module: String::new(),
            details: None,
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the backend module
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Attach structured details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for DomainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.module.is_empty() {
            write!(f, "{}: {}", self.code, self.description)
        } else {
            write!(f, "[{}] {}: {}", self.module, self.code, self.description)
        }
    }
}

impl std::error::Error for DomainFailure {}

/// Errors a single transport attempt can fail with
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The backend rejected the command (business-rule failure)
    #[error("domain failure: {0}")]
    Domain(DomainFailure),

    /// The call could not be carried out (I/O, connection, timeout)
    #[error("{message}")]
    System {
        /// What went wrong
        message: String,
        /// Underlying error, if any
        #[source]
        cause: Option<BoxError>,
    },

    /// Anything the transport could not classify
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransportError {
    /// Create a system failure from a message
    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
            cause: None,
        }
    }

    /// Create a system failure wrapping an underlying error
    pub fn system_with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::System {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// The system failure reported when an attempt runs out of time
    pub fn timed_out(timeout: Duration) -> Self {
        Self::system(format!("timeout reached after {}ms", timeout.as_millis()))
    }

    /// Whether this is a backend-raised domain failure
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }

    /// Whether this is a system-level failure
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System { .. })
    }
}

impl From<DomainFailure> for TransportError {
    fn from(failure: DomainFailure) -> Self {
        Self::Domain(failure)
    }
}
