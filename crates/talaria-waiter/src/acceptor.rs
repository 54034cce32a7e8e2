//! Declarative acceptor rules and their evaluator.
//!
//! An [`Acceptor`] pairs a match condition ([`Matcher`]) with the terminal
//! state the waiter transitions to when the condition fires
//! ([`AcceptorState`]). Acceptors are evaluated in declaration order
//! against each attempt's `(input, result)`; the first whose matcher fires
//! decides the verdict, and if none fire the waiter keeps polling.

use crate::error::WaiterError;
use crate::path::PathExtractor;
use serde::Serialize;
use serde_json::{json, Value};
use talaria_core::ApiError;

/// Terminal state an acceptor transitions the waiter to when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcceptorState {
    /// The awaited condition holds; the wait succeeds.
    Success,
    /// The resource entered a state it cannot leave; the wait fails.
    Failure,
    /// Not there yet; keep polling.
    Retry,
}

/// How a path-extracted value is compared to the expected literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathComparator {
    /// The extracted value is a string equal to the expected literal.
    StringEquals,
    /// The extracted value is a boolean equal to the expected literal
    /// parsed as a boolean.
    BooleanEquals,
    /// The extracted value is a non-empty list of strings, every element
    /// equal to the expected literal. An empty list never matches.
    AllStringEquals,
    /// The extracted value is a list of strings with at least one element
    /// equal to the expected literal.
    AnyStringEquals,
}

/// The condition an acceptor evaluates.
///
/// A closed set: the engine dispatches by pattern match, and generated
/// code constructs variants directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Extracts a value from the operation output (only when the attempt
    /// succeeded) and compares it to `expected`.
    OutputPath {
        /// Path expression handed to the extractor.
        path: String,
        /// Expected literal.
        expected: String,
        /// Comparison to apply.
        comparator: PathComparator,
    },
    /// Like [`Matcher::OutputPath`], but the path is evaluated against a
    /// synthetic `{"input": …, "output": …}` document.
    InputOutputPath {
        /// Path expression handed to the extractor.
        path: String,
        /// Expected literal.
        expected: String,
        /// Comparison to apply.
        comparator: PathComparator,
    },
    /// Fires whenever the attempt succeeded, regardless of output content.
    Success,
    /// Fires whenever the attempt failed with an error whose
    /// [`ApiError::error_code`] equals `code`.
    ErrorType {
        /// The expected error code.
        code: String,
    },
}

/// One declarative waiter rule: a condition and the state it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acceptor {
    /// The condition to evaluate.
    pub matcher: Matcher,
    /// The state the waiter transitions to when the condition fires.
    pub state: AcceptorState,
}

impl Acceptor {
    /// Creates an acceptor from a matcher and terminal state.
    #[must_use]
    pub fn new(matcher: Matcher, state: AcceptorState) -> Self {
        Self { matcher, state }
    }

    /// Acceptor matching a value extracted from the output.
    #[must_use]
    pub fn output_path(
        path: impl Into<String>,
        expected: impl Into<String>,
        comparator: PathComparator,
        state: AcceptorState,
    ) -> Self {
        Self::new(
            Matcher::OutputPath {
                path: path.into(),
                expected: expected.into(),
                comparator,
            },
            state,
        )
    }

    /// Acceptor matching a value extracted from the combined
    /// input/output document.
    #[must_use]
    pub fn input_output_path(
        path: impl Into<String>,
        expected: impl Into<String>,
        comparator: PathComparator,
        state: AcceptorState,
    ) -> Self {
        Self::new(
            Matcher::InputOutputPath {
                path: path.into(),
                expected: expected.into(),
                comparator,
            },
            state,
        )
    }

    /// Acceptor firing on any successful attempt.
    #[must_use]
    pub fn success(state: AcceptorState) -> Self {
        Self::new(Matcher::Success, state)
    }

    /// Acceptor firing on errors carrying the given code.
    #[must_use]
    pub fn error_type(code: impl Into<String>, state: AcceptorState) -> Self {
        Self::new(Matcher::ErrorType { code: code.into() }, state)
    }
}

/// Evaluates `acceptors` in declaration order against one attempt's result.
///
/// Returns `Ok(true)` to keep polling, `Ok(false)` on success, and an error
/// for declared failure states and hard evaluation failures. When no
/// acceptor fires the verdict is retry.
pub(crate) fn evaluate<I, O, E>(
    acceptors: &[Acceptor],
    extractor: &dyn PathExtractor,
    input: &I,
    result: &Result<O, E>,
) -> Result<bool, WaiterError>
where
    I: Serialize,
    O: Serialize,
    E: ApiError,
{
    for acceptor in acceptors {
        let fired = match &acceptor.matcher {
            Matcher::Success => result.is_ok(),

            Matcher::ErrorType { code } => match result {
                Ok(_) => false,
                Err(error) => match error.error_code() {
                    Some(actual) => actual == code,
                    None => {
                        return Err(WaiterError::Evaluation {
                            message: "expected a coded API error for error-type matching"
                                .to_string(),
                        });
                    }
                },
            },

            Matcher::OutputPath {
                path,
                expected,
                comparator,
            } => match result {
                Ok(output) => {
                    let document = to_document(output)?;
                    let value = search(extractor, path, &document)?;
                    compare(&value, expected, *comparator)?
                }
                Err(_) => false,
            },

            Matcher::InputOutputPath {
                path,
                expected,
                comparator,
            } => match result {
                Ok(output) => {
                    let document = json!({
                        "input": to_document(input)?,
                        "output": to_document(output)?,
                    });
                    let value = search(extractor, path, &document)?;
                    compare(&value, expected, *comparator)?
                }
                Err(_) => false,
            },
        };

        if fired {
            return match acceptor.state {
                AcceptorState::Success => Ok(false),
                AcceptorState::Retry => Ok(true),
                AcceptorState::Failure => Err(WaiterError::FailureState {
                    source: result
                        .as_ref()
                        .err()
                        .map(|error| anyhow::anyhow!("{error}")),
                }),
            };
        }
    }

    // No acceptor fired: not terminal, keep polling.
    Ok(true)
}

fn to_document<T: Serialize>(value: &T) -> Result<Value, WaiterError> {
    serde_json::to_value(value).map_err(|err| WaiterError::Evaluation {
        message: format!("failed to serialize value for path matching: {err}"),
    })
}

fn search(extractor: &dyn PathExtractor, path: &str, document: &Value) -> Result<Value, WaiterError> {
    extractor.search(path, document).map_err(|err| WaiterError::Evaluation {
        message: err.to_string(),
    })
}

fn compare(value: &Value, expected: &str, comparator: PathComparator) -> Result<bool, WaiterError> {
    match comparator {
        PathComparator::StringEquals => match value.as_str() {
            Some(actual) => Ok(actual == expected),
            None => Err(mismatch("a string", value)),
        },
        PathComparator::BooleanEquals => {
            let expected: bool = expected.parse().map_err(|_| WaiterError::Evaluation {
                message: format!("expected value `{expected}` is not a boolean literal"),
            })?;
            match value.as_bool() {
                Some(actual) => Ok(actual == expected),
                None => Err(mismatch("a boolean", value)),
            }
        }
        PathComparator::AllStringEquals => {
            let items = string_list(value)?;
            Ok(!items.is_empty() && items.iter().all(|item| *item == expected))
        }
        PathComparator::AnyStringEquals => {
            let items = string_list(value)?;
            Ok(items.iter().any(|item| *item == expected))
        }
    }
}

fn string_list(value: &Value) -> Result<Vec<&str>, WaiterError> {
    let Some(items) = value.as_array() else {
        return Err(mismatch("a list of strings", value));
    };
    items
        .iter()
        .map(|item| item.as_str().ok_or_else(|| mismatch("a list of strings", item)))
        .collect()
}

fn mismatch(expected: &str, got: &Value) -> WaiterError {
    WaiterError::Evaluation {
        message: format!("comparator expected {expected}, got `{got}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::JsonPointer;

    #[derive(Debug, Serialize)]
    struct Params {
        name: &'static str,
    }

    #[derive(Debug, Serialize)]
    struct FleetStatus {
        state: &'static str,
        ready: bool,
        instance_states: Vec<&'static str>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("api error {code:?}")]
    struct FixtureError {
        code: Option<&'static str>,
    }

    impl ApiError for FixtureError {
        fn error_code(&self) -> Option<&str> {
            self.code
        }
    }

    fn ready_fleet() -> FleetStatus {
        FleetStatus {
            state: "ready",
            ready: true,
            instance_states: vec!["running", "running"],
        }
    }

    fn run(
        acceptors: &[Acceptor],
        result: &Result<FleetStatus, FixtureError>,
    ) -> Result<bool, WaiterError> {
        evaluate(acceptors, &JsonPointer, &Params { name: "fleet-1" }, result)
    }

    #[test]
    fn test_success_matcher_fires_on_ok() {
        let acceptors = [Acceptor::success(AcceptorState::Success)];
        assert_eq!(run(&acceptors, &Ok(ready_fleet())).unwrap(), false);
    }

    #[test]
    fn test_no_acceptor_fires_defaults_to_retry() {
        let acceptors = [Acceptor::output_path(
            "/state",
            "ready",
            PathComparator::StringEquals,
            AcceptorState::Success,
        )];
        let pending = FleetStatus {
            state: "provisioning",
            ..ready_fleet()
        };
        assert_eq!(run(&acceptors, &Ok(pending)).unwrap(), true);
    }

    #[test]
    fn test_first_firing_acceptor_wins() {
        let acceptors = [
            Acceptor::output_path("/state", "ready", PathComparator::StringEquals, AcceptorState::Success),
            Acceptor::success(AcceptorState::Retry),
        ];

        // Both match on a ready fleet; declaration order decides.
        assert_eq!(run(&acceptors, &Ok(ready_fleet())).unwrap(), false);

        // Only the second matches on a pending fleet.
        let pending = FleetStatus {
            state: "provisioning",
            ..ready_fleet()
        };
        assert_eq!(run(&acceptors, &Ok(pending)).unwrap(), true);
    }

    #[test]
    fn test_error_type_retry_and_failure() {
        let not_found = || Err(FixtureError { code: Some("NotFound") });

        let retrying = [Acceptor::error_type("NotFound", AcceptorState::Retry)];
        assert_eq!(run(&retrying, &not_found()).unwrap(), true);

        let failing = [Acceptor::error_type("NotFound", AcceptorState::Failure)];
        let err = run(&failing, &not_found()).unwrap_err();
        assert!(matches!(err, WaiterError::FailureState { source: Some(_) }));
    }

    #[test]
    fn test_error_type_ignores_other_codes() {
        let acceptors = [Acceptor::error_type("NotFound", AcceptorState::Failure)];
        let result = Err(FixtureError { code: Some("Throttled") });
        // Falls through to the default verdict.
        assert_eq!(run(&acceptors, &result).unwrap(), true);
    }

    #[test]
    fn test_uncoded_error_fails_evaluation() {
        let acceptors = [Acceptor::error_type("NotFound", AcceptorState::Retry)];
        let result = Err(FixtureError { code: None });
        let err = run(&acceptors, &result).unwrap_err();
        assert!(matches!(err, WaiterError::Evaluation { .. }));
    }

    #[test]
    fn test_path_matchers_skip_failed_attempts() {
        let acceptors = [
            Acceptor::output_path("/state", "ready", PathComparator::StringEquals, AcceptorState::Success),
            Acceptor::error_type("NotFound", AcceptorState::Retry),
        ];
        let result = Err(FixtureError { code: Some("NotFound") });
        assert_eq!(run(&acceptors, &result).unwrap(), true);
    }

    #[test]
    fn test_boolean_equals() {
        let acceptors = [Acceptor::output_path(
            "/ready",
            "true",
            PathComparator::BooleanEquals,
            AcceptorState::Success,
        )];
        assert_eq!(run(&acceptors, &Ok(ready_fleet())).unwrap(), false);

        let unparsable = [Acceptor::output_path(
            "/ready",
            "yes",
            PathComparator::BooleanEquals,
            AcceptorState::Success,
        )];
        let err = run(&unparsable, &Ok(ready_fleet())).unwrap_err();
        assert!(matches!(err, WaiterError::Evaluation { .. }));
    }

    #[test]
    fn test_comparator_type_mismatch_is_a_hard_error() {
        // `/ready` is a boolean; StringEquals requires a string.
        let acceptors = [Acceptor::output_path(
            "/ready",
            "true",
            PathComparator::StringEquals,
            AcceptorState::Success,
        )];
        let err = run(&acceptors, &Ok(ready_fleet())).unwrap_err();
        assert!(matches!(err, WaiterError::Evaluation { .. }));
    }

    #[test]
    fn test_missing_path_is_a_hard_error() {
        let acceptors = [Acceptor::output_path(
            "/nope",
            "ready",
            PathComparator::StringEquals,
            AcceptorState::Success,
        )];
        let err = run(&acceptors, &Ok(ready_fleet())).unwrap_err();
        assert!(matches!(err, WaiterError::Evaluation { .. }));
    }

    #[test]
    fn test_all_string_equals() {
        let acceptors = [Acceptor::output_path(
            "/instance_states",
            "running",
            PathComparator::AllStringEquals,
            AcceptorState::Success,
        )];
        assert_eq!(run(&acceptors, &Ok(ready_fleet())).unwrap(), false);

        let mixed = FleetStatus {
            instance_states: vec!["running", "stopping"],
            ..ready_fleet()
        };
        assert_eq!(run(&acceptors, &Ok(mixed)).unwrap(), true);
    }

    #[test]
    fn test_all_string_equals_empty_list_never_matches() {
        let acceptors = [
            Acceptor::output_path(
                "/instance_states",
                "running",
                PathComparator::AllStringEquals,
                AcceptorState::Success,
            ),
            Acceptor::success(AcceptorState::Retry),
        ];
        let empty = FleetStatus {
            instance_states: vec![],
            ..ready_fleet()
        };
        // Falls through to the next acceptor.
        assert_eq!(run(&acceptors, &Ok(empty)).unwrap(), true);
    }

    #[test]
    fn test_any_string_equals() {
        let acceptors = [Acceptor::output_path(
            "/instance_states",
            "stopping",
            PathComparator::AnyStringEquals,
            AcceptorState::Failure,
        )];
        let mixed = FleetStatus {
            instance_states: vec!["running", "stopping"],
            ..ready_fleet()
        };
        let err = run(&acceptors, &Ok(mixed)).unwrap_err();
        // A Failure acceptor fired on a successful attempt; no source error.
        assert!(matches!(err, WaiterError::FailureState { source: None }));
    }

    #[test]
    fn test_input_output_path() {
        let acceptors = [Acceptor::input_output_path(
            "/input/name",
            "fleet-1",
            PathComparator::StringEquals,
            AcceptorState::Success,
        )];
        assert_eq!(run(&acceptors, &Ok(ready_fleet())).unwrap(), false);
    }
}
