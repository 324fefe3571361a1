//! Maps raw transport failures to [`ClassifiedError`] kinds.

use crate::error::ClassifiedError;
use invokekit_transport::TransportError;

/// Classify a raw transport failure.
///
/// | transport failure | classification |
/// |---|---|
/// | system failure mentioning a timeout | [`ClassifiedError::Timeout`] |
/// | any other system failure | [`ClassifiedError::SystemFailure`] |
/// | domain failure | [`ClassifiedError::DomainFailure`], fields verbatim |
/// | anything else | [`ClassifiedError::Unknown`] |
///
/// # Examples
///
/// ```rust
/// use invokekit::classify::classify;
/// use invokekit::ClassifiedError;
/// use invokekit_transport::TransportError;
///
/// let classified = classify(TransportError::system("request timed out after 30000ms"));
/// assert!(matches!(classified, ClassifiedError::Timeout { .. }));
/// ```
pub fn classify(error: TransportError) -> ClassifiedError {
    match error {
        TransportError::Domain(failure) => ClassifiedError::DomainFailure(failure),
        TransportError::System { .. } => {
            let message = error.to_string();
            if indicates_timeout(&message) {
                ClassifiedError::Timeout {
                    message,
                    cause: Some(error),
                }
            } else {
                ClassifiedError::SystemFailure {
                    message,
                    cause: Some(error),
                }
            }
        }
        TransportError::Other(_) => ClassifiedError::Unknown {
            message: error.to_string(),
            cause: Some(error),
        },
    }
}

fn indicates_timeout(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("timeout") || message.contains("timed out")
}

impl From<TransportError> for ClassifiedError {
    fn from(error: TransportError) -> Self {
        classify(error)
    }
}
