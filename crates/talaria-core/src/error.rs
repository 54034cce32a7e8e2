//! Error classification for retry and waiter decisions.
//!
//! Operation errors are modeled by generated code, not by this runtime.
//! What the runtime needs from them is narrow: a stable, service-visible
//! error code and a coarse fault attribution. [`ApiError`] is that contract.

use std::error::Error;

/// Attribution of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorFault {
    /// The caller's request was at fault.
    Client,
    /// The service failed to process a valid request.
    Server,
    /// The fault could not be determined.
    #[default]
    Unknown,
}

/// An error carrying a stable, service-visible classification.
///
/// Generated error types implement this so the waiter's error-type acceptors
/// (and caller-supplied retry predicates) can classify failures without
/// downcasting to concrete types.
///
/// # Example
///
/// ```
/// use talaria_core::{ApiError, ErrorFault};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("widget does not exist")]
/// struct WidgetNotFound;
///
/// impl ApiError for WidgetNotFound {
///     fn error_code(&self) -> Option<&str> {
///         Some("NotFound")
///     }
///
///     fn error_fault(&self) -> ErrorFault {
///         ErrorFault::Client
///     }
/// }
/// ```
pub trait ApiError: Error {
    /// The stable code identifying this failure class, if the service
    /// defined one.
    ///
    /// Returning `None` marks the error as unclassified; acceptors that
    /// require a code treat unclassified errors as evaluation failures.
    fn error_code(&self) -> Option<&str>;

    /// Which party is at fault for this error.
    fn error_fault(&self) -> ErrorFault {
        ErrorFault::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    enum FixtureError {
        #[error("throttled, slow down")]
        Throttled,
        #[error("connection reset")]
        ConnectionReset,
    }

    impl ApiError for FixtureError {
        fn error_code(&self) -> Option<&str> {
            match self {
                Self::Throttled => Some("ThrottlingException"),
                Self::ConnectionReset => None,
            }
        }

        fn error_fault(&self) -> ErrorFault {
            match self {
                Self::Throttled => ErrorFault::Client,
                Self::ConnectionReset => ErrorFault::Unknown,
            }
        }
    }

    #[test]
    fn test_classified_error() {
        let err = FixtureError::Throttled;
        assert_eq!(err.error_code(), Some("ThrottlingException"));
        assert_eq!(err.error_fault(), ErrorFault::Client);
    }

    #[test]
    fn test_unclassified_error() {
        let err = FixtureError::ConnectionReset;
        assert_eq!(err.error_code(), None);
        assert_eq!(err.error_fault(), ErrorFault::Unknown);
    }
}
