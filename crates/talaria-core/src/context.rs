//! Per-invocation context.
//!
//! A [`Context`] is created for every operation invocation and flows down
//! the handler chain by mutable reference. Middleware enrich it with typed
//! properties; the waiter reuses one context across all attempts of a wait
//! so correlation ids remain stable in logs.

use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Unique identifier for one operation invocation.
///
/// Invocation ids are UUID v7: time-ordered, globally unique without
/// coordination, and usable for log correlation across retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a fresh invocation id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Mutable state that flows down the handler chain.
///
/// The context carries an invocation id, the instant the invocation started,
/// and a typed property bag. Properties flow *down* (configuration, resolved
/// endpoints, auth material); results flow *up* through [`Metadata`].
///
/// # Example
///
/// ```
/// use talaria_core::Context;
///
/// #[derive(Debug, PartialEq)]
/// struct OperationName(&'static str);
///
/// let mut cx = Context::new();
/// cx.properties_mut().insert(OperationName("GetWidget"));
///
/// assert_eq!(
///     cx.properties().get::<OperationName>(),
///     Some(&OperationName("GetWidget")),
/// );
/// ```
#[derive(Debug)]
pub struct Context {
    /// Unique identifier for this invocation.
    invocation_id: InvocationId,

    /// When the invocation started.
    started_at: Instant,

    /// Typed properties attached by the caller or by middleware.
    properties: Metadata,
}

impl Context {
    /// Creates a context with a fresh invocation id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            invocation_id: InvocationId::new(),
            started_at: Instant::now(),
            properties: Metadata::new(),
        }
    }

    /// Creates a context with a caller-provided invocation id.
    ///
    /// Useful when the id was minted upstream and must be propagated.
    #[must_use]
    pub fn with_invocation_id(invocation_id: InvocationId) -> Self {
        Self {
            invocation_id,
            started_at: Instant::now(),
            properties: Metadata::new(),
        }
    }

    /// Returns the invocation id.
    #[must_use]
    pub fn invocation_id(&self) -> InvocationId {
        self.invocation_id
    }

    /// Returns when the invocation started.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the invocation started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Returns the typed property bag.
    #[must_use]
    pub fn properties(&self) -> &Metadata {
        &self.properties
    }

    /// Returns the typed property bag mutably.
    pub fn properties_mut(&mut self) -> &mut Metadata {
        &mut self.properties
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique() {
        assert_ne!(InvocationId::new(), InvocationId::new());
    }

    #[test]
    fn test_with_invocation_id() {
        let id = InvocationId::new();
        let cx = Context::with_invocation_id(id);
        assert_eq!(cx.invocation_id(), id);
    }

    #[test]
    fn test_properties_round_trip() {
        #[derive(Debug, PartialEq)]
        struct Endpoint(String);

        let mut cx = Context::new();
        assert!(cx.properties().get::<Endpoint>().is_none());

        cx.properties_mut()
            .insert(Endpoint("https://api.example.com".to_string()));
        assert_eq!(
            cx.properties().get::<Endpoint>(),
            Some(&Endpoint("https://api.example.com".to_string())),
        );
    }

    #[test]
    fn test_elapsed_advances() {
        let cx = Context::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(cx.elapsed() >= std::time::Duration::from_millis(5));
    }
}
