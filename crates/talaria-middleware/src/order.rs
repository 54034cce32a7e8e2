//! Relative ordering of unique identifiers.
//!
//! [`RelativeOrder`] is the sole source of execution sequence for a
//! registry: it maintains a list of unique ids supporting anchored
//! insertion, in-place replacement, and removal. Identity-to-behavior
//! binding is layered on top by [`crate::registry::OrderedRegistry`].
//!
//! Lookup by id is a linear scan. Pipelines hold tens of entries and are
//! mutated during setup, then traversed on every request; a hash index
//! would buy nothing here and would complicate the in-place semantics of
//! [`RelativeOrder::swap`].

use crate::error::RegistryError;

/// Where to place an entry relative to the whole order or to an anchor.
///
/// Only meaningful at insertion time; positions are not stored as entry
/// state afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativePosition {
    /// Before the anchor, or at the front of the order.
    Before,
    /// After the anchor, or at the end of the order.
    After,
}

/// An ordered sequence of unique identifiers.
#[derive(Debug, Clone, Default)]
pub struct RelativeOrder {
    order: Vec<String>,
}

impl RelativeOrder {
    /// Creates an empty order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` at the front (`Before`) or back (`After`) of the order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateId`] if `id` is already present.
    pub fn add(&mut self, id: impl Into<String>, pos: RelativePosition) -> Result<(), RegistryError> {
        let id = id.into();
        if self.position(&id).is_some() {
            return Err(RegistryError::DuplicateId { id });
        }

        match pos {
            RelativePosition::Before => self.order.insert(0, id),
            RelativePosition::After => self.order.push(id),
        }
        Ok(())
    }

    /// Inserts `id` immediately before or after `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateId`] if `id` is already present,
    /// or [`RegistryError::AnchorNotFound`] if `anchor` is absent.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        anchor: &str,
        pos: RelativePosition,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        if self.position(&id).is_some() {
            return Err(RegistryError::DuplicateId { id });
        }
        let Some(at) = self.position(anchor) else {
            return Err(RegistryError::AnchorNotFound {
                id: anchor.to_string(),
            });
        };

        match pos {
            RelativePosition::Before => self.order.insert(at, id),
            RelativePosition::After => self.order.insert(at + 1, id),
        }
        Ok(())
    }

    /// Replaces `id` with `to` in place, preserving its position relative
    /// to every other entry.
    ///
    /// Swapping an id for itself is allowed; that is how a reserved slot is
    /// filled without disturbing its neighbors.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if `id` is absent, or
    /// [`RegistryError::DuplicateId`] if `to` already exists elsewhere.
    pub fn swap(&mut self, id: &str, to: impl Into<String>) -> Result<(), RegistryError> {
        let to = to.into();
        let Some(at) = self.position(id) else {
            return Err(RegistryError::NotFound { id: id.to_string() });
        };
        if to != id && self.position(&to).is_some() {
            return Err(RegistryError::DuplicateId { id: to });
        }

        self.order[at] = to;
        Ok(())
    }

    /// Removes `id`, shifting subsequent entries forward.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if `id` is absent.
    pub fn remove(&mut self, id: &str) -> Result<(), RegistryError> {
        let Some(at) = self.position(id) else {
            return Err(RegistryError::NotFound { id: id.to_string() });
        };
        self.order.remove(at);
        Ok(())
    }

    /// Returns an owned snapshot of the current order.
    ///
    /// The snapshot does not alias internal storage; later mutation cannot
    /// corrupt it.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    /// Returns `true` if `id` is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the order is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, String> {
        self.order.iter()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|entry| entry == id)
    }
}
