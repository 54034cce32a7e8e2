//! Waiter error taxonomy.
//!
//! Every failure a wait can end in is a distinct variant, so callers can
//! tell a deadline from a cancellation from a declared failure state by
//! matching, not string inspection.

use thiserror::Error;

/// Errors returned from a waiter's single `wait` return path.
#[derive(Debug, Error)]
pub enum WaiterError {
    /// The maximum wait time was zero. A configuration error, surfaced
    /// before the first attempt.
    #[error("maximum wait time for waiter must be greater than zero")]
    InvalidMaxWaitTime,

    /// The delay configuration was unusable (zero or inverted min/max).
    #[error("invalid waiter delay configuration: {message}")]
    InvalidDelay {
        /// What was wrong with the configuration.
        message: String,
    },

    /// The cumulative wait budget was exhausted without reaching a terminal
    /// acceptor state.
    #[error("exceeded maximum wait time for waiter")]
    ExceededMaxWait,

    /// The deadline cut a backoff sleep short. Distinct from
    /// [`Self::ExceededMaxWait`] so observers can tell a cancelled sleep
    /// from an exhausted budget.
    #[error("request cancelled while waiting")]
    Cancelled,

    /// An acceptor with a Failure state matched.
    #[error("waiter state transitioned to failure")]
    FailureState {
        /// The operation error that drove the transition, when one existed.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Acceptor evaluation itself failed: path extraction, output
    /// serialization, or a comparator type mismatch. Never retried; the
    /// response shape is malformed relative to the model.
    #[error("error evaluating waiter state: {message}")]
    Evaluation {
        /// What failed during evaluation.
        message: String,
    },
}

impl WaiterError {
    /// Returns `true` for the exhausted-budget terminal state.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ExceededMaxWait)
    }

    /// Returns `true` when a sleep was cut short by the deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_and_cancellation_are_distinguishable() {
        assert!(WaiterError::ExceededMaxWait.is_timeout());
        assert!(!WaiterError::ExceededMaxWait.is_cancelled());
        assert!(WaiterError::Cancelled.is_cancelled());
        assert!(!WaiterError::Cancelled.is_timeout());
    }

    #[test]
    fn test_failure_state_carries_source() {
        let err = WaiterError::FailureState {
            source: Some(anyhow::anyhow!("widget entered TERMINATED")),
        };
        let source = std::error::Error::source(&err).expect("source should be attached");
        assert!(source.to_string().contains("TERMINATED"));
    }
}
