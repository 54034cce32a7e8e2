//! Path extraction over structured response documents.
//!
//! Path-based acceptors compare a value *extracted* from the operation
//! output against an expected literal. Which path language does the
//! extracting is a collaborator decision (generated clients bring their
//! own), so the engine only depends on the [`PathExtractor`] seam.
//! [`JsonPointer`] is the provided implementation, backed by the pointer
//! support already in `serde_json`.

use serde_json::Value;
use thiserror::Error;

/// Failure to resolve a path inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no value found at path `{path}`")]
pub struct PathError {
    /// The path that failed to resolve.
    pub path: String,
}

/// Extracts a value from a structured document by path expression.
///
/// Extraction failure is a hard evaluation error for the acceptor that
/// asked, not a "no match".
pub trait PathExtractor: Send + Sync {
    /// Returns the value at `path` within `document`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] when the path resolves to nothing.
    fn search(&self, path: &str, document: &Value) -> Result<Value, PathError>;
}

/// JSON Pointer (RFC 6901) extraction, e.g. `/status` or `/instances/0/state`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPointer;

impl PathExtractor for JsonPointer {
    fn search(&self, path: &str, document: &Value) -> Result<Value, PathError> {
        document.pointer(path).cloned().ok_or_else(|| PathError {
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pointer_extracts_nested_values() {
        let document = json!({
            "widget": { "status": "ready", "tags": ["a", "b"] }
        });

        assert_eq!(
            JsonPointer.search("/widget/status", &document).unwrap(),
            json!("ready")
        );
        assert_eq!(
            JsonPointer.search("/widget/tags/1", &document).unwrap(),
            json!("b")
        );
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let document = json!({ "widget": {} });
        let err = JsonPointer.search("/widget/status", &document).unwrap_err();
        assert_eq!(err.path, "/widget/status");
    }
}
