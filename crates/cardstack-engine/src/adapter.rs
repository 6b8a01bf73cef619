#![forbid(unsafe_code)]

//! The pull interface to the host's dataset.
//!
//! The engine never owns items. It asks a [`CardAdapter`] how many exist,
//! which identity sits at a given index, and to populate a slot's visual
//! content. A fixed list is just an adapter whose count never changes; see
//! [`VecAdapter`].

use std::collections::BTreeMap;
use std::fmt;

use cardstack_core::geometry::Rect;

use crate::error::AdapterError;
use crate::window::SlotId;

/// Data provider for the card stack.
pub trait CardAdapter {
    /// Opaque identity of an item, used to detect a replaced dataset.
    type ItemId: Clone + PartialEq + fmt::Debug;

    /// Current dataset size. Expected to only grow between calls.
    fn count(&self) -> usize;

    /// Identity of the item at `index`, if it exists.
    fn item_at(&self, index: usize) -> Option<Self::ItemId>;

    /// Populate `slot` with the content of item `index`.
    ///
    /// Must be idempotent: the engine may bind the same pair more than once.
    fn bind_view(&mut self, slot: SlotId, index: usize) -> Result<(), AdapterError>;

    /// Region of the top card where a drag may begin, relative to the
    /// card's top-left corner. `None` means the whole card.
    fn draggable_region(&self, _slot: SlotId) -> Option<Rect> {
        None
    }
}

/// Stable identity handed out by [`VecAdapter`] for each stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey(u64);

/// A `Vec`-backed adapter that records which slot shows which item.
#[derive(Debug, Clone)]
pub struct VecAdapter<T> {
    items: Vec<(ItemKey, T)>,
    next_key: u64,
    bindings: BTreeMap<SlotId, usize>,
    bind_calls: usize,
    draggable_region: Option<Rect>,
}

impl<T> Default for VecAdapter<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> VecAdapter<T> {
    /// Wrap a list of items.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        let mut adapter = Self {
            items: Vec::with_capacity(items.len()),
            next_key: 0,
            bindings: BTreeMap::new(),
            bind_calls: 0,
            draggable_region: None,
        };
        adapter.extend(items);
        adapter
    }

    /// Restrict drags to `region` (builder pattern).
    #[must_use]
    pub fn with_draggable_region(mut self, region: Rect) -> Self {
        self.draggable_region = Some(region);
        self
    }

    /// Append one item.
    pub fn push(&mut self, item: T) {
        let key = ItemKey(self.next_key);
        self.next_key += 1;
        self.items.push((key, item));
    }

    /// Append many items.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.push(item);
        }
    }

    /// Replace the whole dataset. Every new item gets a fresh identity.
    pub fn replace(&mut self, items: Vec<T>) {
        self.items.clear();
        self.bindings.clear();
        self.extend(items);
    }

    /// Drop items from the back (simulates a misbehaving source).
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index).map(|(_, item)| item)
    }

    /// Dataset index currently bound to `slot`.
    #[must_use]
    pub fn bound_index(&self, slot: SlotId) -> Option<usize> {
        self.bindings.get(&slot).copied()
    }

    /// Item currently shown by `slot`.
    #[must_use]
    pub fn bound_item(&self, slot: SlotId) -> Option<&T> {
        self.bound_index(slot).and_then(|index| self.get(index))
    }

    /// Total `bind_view` calls, successful or not.
    #[must_use]
    pub fn bind_calls(&self) -> usize {
        self.bind_calls
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no items are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> CardAdapter for VecAdapter<T> {
    type ItemId = ItemKey;

    fn count(&self) -> usize {
        self.items.len()
    }

    fn item_at(&self, index: usize) -> Option<ItemKey> {
        self.items.get(index).map(|(key, _)| *key)
    }

    fn bind_view(&mut self, slot: SlotId, index: usize) -> Result<(), AdapterError> {
        self.bind_calls += 1;
        if index >= self.items.len() {
            self.bindings.remove(&slot);
            return Err(AdapterError::new(format!(
                "index {index} out of bounds for {} items",
                self.items.len()
            )));
        }
        self.bindings.insert(slot, index);
        Ok(())
    }

    fn draggable_region(&self, _slot: SlotId) -> Option<Rect> {
        self.draggable_region
    }
}
