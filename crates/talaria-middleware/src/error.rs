//! Error types for stack configuration and chain execution.
//!
//! Registry errors are configuration errors: they indicate a programming or
//! setup mistake and are returned synchronously from the mutating call,
//! never deferred to request time.

use thiserror::Error;

/// Errors raised while mutating an ordered middleware registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An id required by the call was empty.
    #[error("{role} id must not be empty")]
    EmptyId {
        /// Which argument was empty (e.g. `"middleware"`, `"anchor"`).
        role: &'static str,
    },

    /// The id is already present in the registry.
    #[error("id `{id}` already exists")]
    DuplicateId {
        /// The id that collided.
        id: String,
    },

    /// The id is not present in the registry.
    #[error("id `{id}` not found")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The anchor of a relative insertion is not present.
    #[error("anchor id `{id}` not found")]
    AnchorNotFound {
        /// The missing anchor id.
        id: String,
    },

    /// A slot may only be filled by an item claiming the slot's exact id.
    ///
    /// Other middleware may anchor insertions on the slot id, so the id must
    /// survive the fill.
    #[error("swap target id `{to}` must match slot id `{slot}`")]
    SlotMismatch {
        /// The slot being filled.
        slot: String,
        /// The mismatched id of the item offered as a replacement.
        to: String,
    },
}

/// Errors raised by chain execution itself, as opposed to errors returned
/// by middleware or the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The deserialize chain completed without any middleware producing an
    /// operation result from the raw response.
    #[error("deserialize chain completed without producing an operation result")]
    MissingResult,
}
