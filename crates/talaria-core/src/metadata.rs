//! Type-keyed metadata returned alongside operation outputs.
//!
//! Every handler in the chain returns a [`Metadata`] value together with its
//! output. Middleware closer to the caller may read what inner middleware
//! recorded (raw transport details, attempt counts, deserialized error
//! envelopes) without the output types having to know about each other.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// A heterogeneous, type-keyed map of values that flows up the handler chain.
///
/// Keys are Rust types; at most one value per type is stored. Middleware
/// insert values under their own marker types and readers retrieve them by
/// type, so independently-authored middleware cannot collide.
///
/// # Example
///
/// ```
/// use talaria_core::Metadata;
///
/// #[derive(Debug, PartialEq)]
/// struct AttemptCount(u32);
///
/// let mut metadata = Metadata::new();
/// metadata.insert(AttemptCount(3));
///
/// assert_eq!(metadata.get::<AttemptCount>(), Some(&AttemptCount(3)));
/// ```
#[derive(Debug, Default)]
pub struct Metadata {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Metadata {
    /// Creates an empty metadata map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Stores a value, returning the previous value of the same type if one
    /// was present.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast().ok())
            .map(|boxed| *boxed)
    }

    /// Retrieves a value by type.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }

    /// Removes and returns a value by type.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast().ok())
            .map(|boxed| *boxed)
    }

    /// Returns `true` if a value of the given type is present.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    /// Merges `other` into `self`, overwriting values of types present in
    /// both.
    ///
    /// Used by middleware that combine results from more than one inner
    /// invocation.
    pub fn merge(&mut self, other: Metadata) {
        self.values.extend(other.values);
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct RawStatus(u16);

    #[derive(Debug, Clone, PartialEq)]
    struct ServedFromCache(bool);

    #[test]
    fn test_insert_and_get() {
        let mut metadata = Metadata::new();
        assert!(metadata.is_empty());

        metadata.insert(RawStatus(200));
        assert_eq!(metadata.get::<RawStatus>(), Some(&RawStatus(200)));
        assert_eq!(metadata.len(), 1);
        assert!(metadata.get::<ServedFromCache>().is_none());
    }

    #[test]
    fn test_insert_returns_previous() {
        let mut metadata = Metadata::new();
        assert_eq!(metadata.insert(RawStatus(200)), None);
        assert_eq!(metadata.insert(RawStatus(503)), Some(RawStatus(200)));
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut metadata = Metadata::new();
        metadata.insert(ServedFromCache(true));

        assert_eq!(metadata.remove::<ServedFromCache>(), Some(ServedFromCache(true)));
        assert!(!metadata.contains::<ServedFromCache>());
        assert_eq!(metadata.remove::<ServedFromCache>(), None);
    }

    #[test]
    fn test_merge_overwrites() {
        let mut base = Metadata::new();
        base.insert(RawStatus(200));
        base.insert(ServedFromCache(false));

        let mut incoming = Metadata::new();
        incoming.insert(RawStatus(301));

        base.merge(incoming);
        assert_eq!(base.get::<RawStatus>(), Some(&RawStatus(301)));
        assert_eq!(base.get::<ServedFromCache>(), Some(&ServedFromCache(false)));
    }
}
