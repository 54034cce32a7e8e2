//! Identity-to-behavior binding atop a relative order.
//!
//! [`OrderedRegistry`] owns the add/insert/swap/remove semantics of one
//! pipeline step, including **slots**: ids reserved in the order with no
//! bound behavior, so later middleware can anchor insertions on them before
//! the behavior exists. A slot is filled by adding or swapping in an item
//! that claims the slot's exact id.
//!
//! The [`crate::order::RelativeOrder`] is the sole source of sequence; the
//! entry map binds ids to behavior and carries no ordering information.

use crate::error::RegistryError;
use crate::order::{RelativeOrder, RelativePosition};
use std::collections::HashMap;

/// What an ordered id is bound to.
enum Entry<T> {
    /// A live middleware item.
    Item(T),
    /// A reserved position, optionally filled with behavior later.
    Slot(Option<T>),
}

/// An ordered collection of items with relative ordering by id, supporting
/// reserved slots.
///
/// Mutation requires `&mut self`; execution-time reads ([`Self::get_order`])
/// take `&self`. The "configure single-threaded, then execute concurrently"
/// contract of the stack is therefore enforced by the borrow checker rather
/// than by internal locking.
pub struct OrderedRegistry<T> {
    order: RelativeOrder,
    entries: HashMap<String, Entry<T>>,
}

impl<T> OrderedRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            order: RelativeOrder::new(),
            entries: HashMap::new(),
        }
    }

    /// Returns `true` if `id` designates a slot (filled or not).
    #[must_use]
    pub fn is_slot(&self, id: &str) -> bool {
        matches!(self.entries.get(id), Some(Entry::Slot(_)))
    }

    /// Adds `item` under `id` at the given end of the order.
    ///
    /// If `id` designates a reserved slot, the item fills the slot's
    /// behavior without touching the order; the slot keeps both its
    /// position and its slot identity.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyId`] for an empty id and
    /// [`RegistryError::DuplicateId`] if `id` is already a live item.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        item: T,
        pos: RelativePosition,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RegistryError::EmptyId { role: "middleware" });
        }

        if let Some(Entry::Slot(behavior)) = self.entries.get_mut(&id) {
            *behavior = Some(item);
            return Ok(());
        }

        self.order.add(id.clone(), pos)?;
        self.entries.insert(id, Entry::Item(item));
        Ok(())
    }

    /// Reserves `id` in the order with no bound behavior.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyId`] for an empty id and
    /// [`RegistryError::DuplicateId`] if `id` already exists.
    pub fn add_slot(
        &mut self,
        id: impl Into<String>,
        pos: RelativePosition,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RegistryError::EmptyId { role: "slot" });
        }

        self.order.add(id.clone(), pos)?;
        self.entries.insert(id, Entry::Slot(None));
        Ok(())
    }

    /// Inserts `item` under `id` immediately before or after `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyId`] for an empty id or anchor,
    /// [`RegistryError::DuplicateId`] if `id` already exists, and
    /// [`RegistryError::AnchorNotFound`] if `anchor` is absent.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        item: T,
        anchor: &str,
        pos: RelativePosition,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RegistryError::EmptyId { role: "middleware" });
        }
        if anchor.is_empty() {
            return Err(RegistryError::EmptyId { role: "anchor" });
        }

        self.order.insert(id.clone(), anchor, pos)?;
        self.entries.insert(id, Entry::Item(item));
        Ok(())
    }

    /// Reserves `id` immediately before or after `anchor`.
    ///
    /// # Errors
    ///
    /// Same rules as [`Self::insert`].
    pub fn insert_slot(
        &mut self,
        id: impl Into<String>,
        anchor: &str,
        pos: RelativePosition,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RegistryError::EmptyId { role: "slot" });
        }
        if anchor.is_empty() {
            return Err(RegistryError::EmptyId { role: "anchor" });
        }

        self.order.insert(id.clone(), anchor, pos)?;
        self.entries.insert(id, Entry::Slot(None));
        Ok(())
    }

    /// Returns the item bound to `id`, if any.
    ///
    /// An unfilled slot is not retrievable; it has no behavior yet.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        match self.entries.get(id)? {
            Entry::Item(item) => Some(item),
            Entry::Slot(behavior) => behavior.as_ref(),
        }
    }

    /// Replaces the entry at `id` with `item` bound under `to`, preserving
    /// the entry's position relative to all others.
    ///
    /// Returns the previously bound item, or `None` when `id` was an
    /// unfilled slot.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyId`] for empty ids,
    /// [`RegistryError::SlotMismatch`] if `id` is a slot and `to` differs
    /// from it, [`RegistryError::NotFound`] if `id` is absent, and
    /// [`RegistryError::DuplicateId`] if `to` already exists elsewhere.
    pub fn swap(
        &mut self,
        id: &str,
        to: impl Into<String>,
        item: T,
    ) -> Result<Option<T>, RegistryError> {
        let to = to.into();
        if id.is_empty() {
            return Err(RegistryError::EmptyId { role: "swap source" });
        }
        if to.is_empty() {
            return Err(RegistryError::EmptyId { role: "swap target" });
        }
        if self.is_slot(id) && to != id {
            return Err(RegistryError::SlotMismatch {
                slot: id.to_string(),
                to,
            });
        }

        self.order.swap(id, to.clone())?;

        let previous = match self.entries.remove(id) {
            Some(Entry::Item(previous)) => {
                self.entries.insert(to, Entry::Item(item));
                Some(previous)
            }
            // `to == id` here: the slot-identity rule above already held.
            Some(Entry::Slot(previous)) => {
                self.entries.insert(to, Entry::Slot(Some(item)));
                previous
            }
            None => {
                self.entries.insert(to, Entry::Item(item));
                None
            }
        };

        Ok(previous)
    }

    /// Removes the entry at `id`, vacating its position.
    ///
    /// Slots vacate like any entry: re-adding the same id later creates a
    /// new position at whatever relative point the new call specifies, not
    /// the old one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyId`] for an empty id and
    /// [`RegistryError::NotFound`] if `id` is absent.
    pub fn remove(&mut self, id: &str) -> Result<(), RegistryError> {
        if id.is_empty() {
            return Err(RegistryError::EmptyId { role: "remove" });
        }

        self.order.remove(id)?;
        self.entries.remove(id);
        Ok(())
    }

    /// Returns an owned snapshot of all ids (items and slots) in order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.order.list()
    }

    /// Removes every entry and slot.
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    /// Returns the live items in invocation order, skipping unfilled slots.
    ///
    /// This snapshot is what chain construction consumes.
    #[must_use]
    pub fn get_order(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.order
            .iter()
            .filter_map(|id| match self.entries.get(id.as_str()) {
                Some(Entry::Item(item)) | Some(Entry::Slot(Some(item))) => Some(item.clone()),
                _ => None,
            })
            .collect()
    }
}

impl<T> Default for OrderedRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
