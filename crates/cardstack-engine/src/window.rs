#![forbid(unsafe_code)]

//! Fixed pool of reusable card slots forming a sliding window over the
//! dataset.
//!
//! # Invariants
//!
//! 1. The window always holds exactly `window_size` slots; slots are created
//!    once and only ever rebound and reordered.
//! 2. Depth 0 (the front of [`StackWindow::slots`]) is the sole interactive
//!    slot.
//! 3. A visible slot at depth `d` is bound to `cursor + d`, except for a slot
//!    marked as exiting, which keeps its item until it is recycled.
//! 4. A slot with no dataset index behind it is hidden and unbound.
//!
//! The cursor never moves backwards except through [`RefillMode::Reset`] or a
//! shrinking adapter count.

use std::collections::VecDeque;
use std::fmt;

use cardstack_core::geometry::{CardTransform, Displacement};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapter::CardAdapter;
use crate::config::StackConfig;
use crate::error::{AdapterInconsistency, WindowError};

/// Number of stacked layers that render; deeper slots are spares.
pub const STACK_VISIBLE_DEPTH: usize = 3;

/// Stable handle of one slot in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(usize);

impl SlotId {
    #[must_use]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Position of the slot in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// One reusable card placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardSlot {
    id: SlotId,
    transform: CardTransform,
    bound_index: Option<usize>,
    visible: bool,
    exiting: bool,
}

impl CardSlot {
    fn new(id: SlotId, transform: CardTransform) -> Self {
        Self {
            id,
            transform,
            bound_index: None,
            visible: false,
            exiting: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> SlotId {
        self.id
    }

    #[must_use]
    pub fn transform(&self) -> CardTransform {
        self.transform
    }

    /// Dataset index rendered by this slot.
    #[must_use]
    pub fn bound_index(&self) -> Option<usize> {
        self.bound_index
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Committed to leave the stack; waiting for its recycle.
    #[must_use]
    pub fn is_exiting(&self) -> bool {
        self.exiting
    }

    fn hide(&mut self) {
        self.visible = false;
        self.bound_index = None;
    }

    fn bind<A>(&mut self, index: usize, adapter: &mut A) -> Result<(), AdapterInconsistency>
    where
        A: CardAdapter + ?Sized,
    {
        match adapter.bind_view(self.id, index) {
            Ok(()) => {
                self.bound_index = Some(index);
                self.visible = true;
                Ok(())
            }
            Err(source) => {
                self.hide();
                warn!(
                    target: "cardstack.adapter",
                    slot = %self.id,
                    index,
                    error = %source,
                    "bind_view failed; slot hidden"
                );
                Err(AdapterInconsistency::BindFailed {
                    slot: self.id,
                    index,
                    source,
                })
            }
        }
    }
}

/// Resting geometry of the stack by depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackLayout {
    pub y_offset_step: f32,
    pub scale_step: f32,
}

impl StackLayout {
    #[must_use]
    pub fn from_config(config: &StackConfig) -> Self {
        Self {
            y_offset_step: config.y_offset_step,
            scale_step: config.scale_step,
        }
    }

    /// Resting transform for `depth`. Depths past the last visible layer
    /// share its transform.
    #[must_use]
    pub fn layout_default(&self, depth: usize) -> CardTransform {
        let layer = depth.min(STACK_VISIBLE_DEPTH - 1) as f32;
        CardTransform::IDENTITY
            .with_offset(Displacement::new(0.0, self.y_offset_step * layer))
            .with_uniform_scale(1.0 - self.scale_step * layer)
    }

    /// [`layout_default`](Self::layout_default) with spares made transparent.
    #[must_use]
    pub fn rest_transform(&self, depth: usize) -> CardTransform {
        let transform = self.layout_default(depth);
        if depth >= STACK_VISIBLE_DEPTH {
            transform.with_opacity(0.0)
        } else {
            transform
        }
    }
}

/// Result of a successful [`StackWindow::recycle`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recycled {
    pub slot: SlotId,
    pub previous_cursor: usize,
    pub cursor: usize,
    /// Index the slot was rebound to; `None` if it was hidden.
    pub bound: Option<usize>,
    /// Failed binds, followed by one [`AdapterInconsistency::ItemSkipped`]
    /// per skipped item.
    pub failures: Vec<AdapterInconsistency>,
    /// Items passed over because their slot reached the top unbound.
    pub skipped: Vec<usize>,
    /// Set when the cursor moved and the top card shows an item.
    pub shown: Option<usize>,
}

impl Recycled {
    /// Whether the recycle moved the cursor.
    #[must_use]
    pub fn advanced(&self) -> bool {
        self.cursor != self.previous_cursor
    }
}

/// How [`StackWindow::refill`] treats slots that already show an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillMode {
    /// Bind only hidden slots that now have data.
    Fill,
    /// Rebind every slot from the current cursor so changed content is
    /// picked up.
    Rebind,
    /// Move the cursor to 0 and rebind every slot.
    Reset,
}

/// Result of [`StackWindow::refill`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Refill {
    pub previous_cursor: usize,
    pub cursor: usize,
    /// Set when the top card now shows a different item than before.
    pub shown: Option<usize>,
    /// Slots that became visible (every bound slot on a reset), with their
    /// depth.
    pub revealed: Vec<(SlotId, usize)>,
    pub failures: Vec<AdapterInconsistency>,
    /// Items passed over because their slot reached the top unbound.
    pub skipped: Vec<usize>,
}

/// Result of [`StackWindow::skip_unbound_top`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Skipped {
    pub indices: Vec<usize>,
    /// Binds that failed while refilling the back of the window, and the
    /// skips themselves.
    pub failures: Vec<AdapterInconsistency>,
}

/// Sliding window of card slots over the dataset.
#[derive(Debug, Clone)]
pub struct StackWindow {
    slots: Vec<CardSlot>,
    order: VecDeque<SlotId>,
    cursor: usize,
    dataset_size: usize,
    layout: StackLayout,
    exhausted: bool,
}

impl StackWindow {
    /// Create `window_size` hidden slots at their resting transforms.
    pub fn new(window_size: usize, layout: StackLayout) -> Result<Self, WindowError> {
        if window_size == 0 {
            return Err(WindowError::EmptyWindow);
        }
        let slots = (0..window_size)
            .map(|depth| CardSlot::new(SlotId(depth), layout.rest_transform(depth)))
            .collect();
        Ok(Self {
            slots,
            order: (0..window_size).map(SlotId).collect(),
            cursor: 0,
            dataset_size: 0,
            layout,
            exhausted: false,
        })
    }

    /// Number of slots (W).
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.order.len()
    }

    /// Dataset index of the topmost card.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn dataset_size(&self) -> usize {
        self.dataset_size
    }

    /// Every item up to the end of the dataset has been dismissed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[must_use]
    pub fn layout(&self) -> &StackLayout {
        &self.layout
    }

    /// Resting transform for `depth`.
    #[must_use]
    pub fn layout_default(&self, depth: usize) -> CardTransform {
        self.layout.layout_default(depth)
    }

    /// The interactive slot.
    pub fn top_slot(&self) -> Result<&CardSlot, WindowError> {
        let id = self.order.front().ok_or(WindowError::EmptyWindow)?;
        self.slot(*id)
    }

    /// Slot at stacking depth `depth`.
    pub fn slot_at_depth(&self, depth: usize) -> Result<&CardSlot, WindowError> {
        let id = self
            .order
            .get(depth)
            .ok_or(WindowError::DepthOutOfRange {
                depth,
                window_size: self.window_size(),
            })?;
        self.slot(*id)
    }

    /// Slot by handle.
    pub fn slot(&self, id: SlotId) -> Result<&CardSlot, WindowError> {
        self.slots.get(id.0).ok_or(WindowError::UnknownSlot(id))
    }

    /// Current depth of `id`.
    #[must_use]
    pub fn depth_of(&self, id: SlotId) -> Option<usize> {
        self.order.iter().position(|slot| *slot == id)
    }

    /// Slots front to back.
    pub fn slots(&self) -> impl Iterator<Item = &CardSlot> + '_ {
        self.order.iter().map(|id| &self.slots[id.0])
    }

    fn slot_mut(&mut self, id: SlotId) -> Result<&mut CardSlot, WindowError> {
        self.slots.get_mut(id.0).ok_or(WindowError::UnknownSlot(id))
    }

    /// Slot handed out by this window. A foreign id is logged and ignored.
    fn owned_slot_mut(&mut self, id: SlotId) -> Option<&mut CardSlot> {
        let slot = self.slots.get_mut(id.0);
        if slot.is_none() {
            warn!(target: "cardstack.window", slot = %id, "ignoring update for unknown slot");
        }
        slot
    }

    pub(crate) fn set_transform(&mut self, id: SlotId, transform: CardTransform) {
        if let Some(slot) = self.owned_slot_mut(id) {
            slot.transform = transform;
        }
    }

    pub(crate) fn set_opacity(&mut self, id: SlotId, opacity: f32) {
        if let Some(slot) = self.owned_slot_mut(id) {
            slot.transform = slot.transform.with_opacity(opacity);
        }
    }

    /// Commit `id` to leaving the stack. Only a slot marked this way is moved
    /// by a to-back [`recycle`](Self::recycle).
    pub fn begin_exit(&mut self, id: SlotId) -> Result<(), WindowError> {
        self.slot_mut(id)?.exiting = true;
        Ok(())
    }

    /// Widen the dataset by `delta` items. Hidden slots are bound by the next
    /// [`refill`](Self::refill).
    pub fn append_data(&mut self, delta: usize) {
        self.dataset_size = self.dataset_size.saturating_add(delta);
    }

    /// Adopt the adapter's count. A smaller count than previously observed
    /// is reported and the cursor is clamped into the new range.
    pub fn sync_dataset_size(&mut self, count: usize) -> Option<AdapterInconsistency> {
        if count >= self.dataset_size {
            self.dataset_size = count;
            return None;
        }
        let issue = AdapterInconsistency::CountShrank {
            observed: self.dataset_size,
            reported: count,
        };
        warn!(target: "cardstack.adapter", %issue, "dataset shrank; clamping cursor");
        self.dataset_size = count;
        self.cursor = self.cursor.min(count.saturating_sub(1));
        self.exhausted = false;
        Some(issue)
    }

    /// Initial bind from the adapter: no fades, no notifications.
    pub fn populate<A>(&mut self, adapter: &mut A) -> Vec<AdapterInconsistency>
    where
        A: CardAdapter + ?Sized,
    {
        let mut failures = Vec::new();
        failures.extend(self.sync_dataset_size(adapter.count()));
        failures.extend(self.refill(RefillMode::Rebind, adapter).failures);
        failures
    }

    /// Bind slots from the cursor according to `mode`.
    pub fn refill<A>(&mut self, mode: RefillMode, adapter: &mut A) -> Refill
    where
        A: CardAdapter + ?Sized,
    {
        let previous_cursor = self.cursor;
        let previous_top = self.top_binding();
        match mode {
            RefillMode::Reset => {
                self.cursor = 0;
                self.exhausted = false;
                for slot in &mut self.slots {
                    slot.exiting = false;
                }
            }
            // A window that ran dry resumes at the first unseen item.
            RefillMode::Fill | RefillMode::Rebind => {
                if self.exhausted && self.cursor + 1 < self.dataset_size {
                    self.cursor += 1;
                    self.exhausted = false;
                }
            }
        }
        let reset = mode == RefillMode::Reset;

        let mut refill = Refill {
            previous_cursor,
            cursor: self.cursor,
            ..Refill::default()
        };
        for depth in 0..self.order.len() {
            let id = self.order[depth];
            let target = self.cursor + depth;
            let layout = self.layout;
            let slot = &mut self.slots[id.0];
            let was_visible = slot.visible;
            if slot.exiting || (mode == RefillMode::Fill && was_visible) {
                continue;
            }
            // An exhausted cursor points at an item that already left.
            if self.exhausted || target >= self.dataset_size {
                slot.hide();
                continue;
            }
            let reveal = reset || !was_visible;
            if reveal {
                slot.transform = layout.rest_transform(depth);
            }
            match slot.bind(target, adapter) {
                Ok(()) if reveal => refill.revealed.push((id, depth)),
                Ok(()) => {}
                Err(issue) => refill.failures.push(issue),
            }
        }

        let skipped = self.skip_unbound_top(adapter);
        refill.failures.extend(skipped.failures);
        refill.skipped = skipped.indices;
        refill.cursor = self.cursor;

        let top = self.top_binding();
        if top.is_some() && (top != previous_top || mode == RefillMode::Reset) {
            refill.shown = top;
        }
        debug!(
            target: "cardstack.window",
            ?mode,
            previous_cursor,
            cursor = self.cursor,
            revealed = refill.revealed.len(),
            failures = refill.failures.len(),
            skipped = refill.skipped.len(),
            "refill"
        );
        refill
    }

    /// Pass over items whose slot reached the top without a binding.
    ///
    /// While the top slot is hidden but the cursor still points into the
    /// dataset, that item failed to bind: its slot is moved to the back like
    /// an exit and the cursor advances. Stops at the first bound top card or
    /// once the dataset runs out.
    pub fn skip_unbound_top<A>(&mut self, adapter: &mut A) -> Skipped
    where
        A: CardAdapter + ?Sized,
    {
        let mut skipped = Skipped::default();
        while !self.exhausted && self.cursor < self.dataset_size {
            let Some(&id) = self.order.front() else {
                break;
            };
            let slot = &mut self.slots[id.0];
            if slot.visible || slot.exiting {
                break;
            }
            let index = self.cursor;
            slot.exiting = true;
            let Ok(Some(recycled)) = self.rotate_to_back(id, adapter) else {
                break;
            };
            debug!(target: "cardstack.window", index, cursor = recycled.cursor, "skipped unbound item");
            skipped.indices.push(index);
            skipped.failures.extend(recycled.failures);
            skipped
                .failures
                .push(AdapterInconsistency::ItemSkipped { index });
        }
        if !skipped.indices.is_empty() {
            self.relayout();
        }
        skipped
    }

    /// Every slot not in flight back to its resting transform.
    fn relayout(&mut self) {
        for (depth, id) in self.order.iter().enumerate() {
            let slot = &mut self.slots[id.0];
            if !slot.exiting {
                slot.transform = self.layout.rest_transform(depth);
            }
        }
    }

    /// Recycle `id`.
    ///
    /// With `to_back`, a slot marked by [`begin_exit`](Self::begin_exit) is
    /// moved to the back of the window at depth `W-1`, made transparent, the
    /// cursor advances if another item exists, and the slot is rebound to
    /// the item entering the window (or hidden if there is none). Unmarked
    /// slots are left alone, so a repeated call is a no-op. A new top card
    /// that failed to bind is passed over with
    /// [`skip_unbound_top`](Self::skip_unbound_top).
    ///
    /// Without `to_back`, the slot is rebound in place to `cursor + depth`
    /// and reset to its resting transform; a slot already showing that item
    /// is left alone.
    pub fn recycle<A>(
        &mut self,
        id: SlotId,
        to_back: bool,
        adapter: &mut A,
    ) -> Result<Option<Recycled>, WindowError>
    where
        A: CardAdapter + ?Sized,
    {
        let depth = self.depth_of(id).ok_or(WindowError::UnknownSlot(id))?;
        if to_back {
            self.recycle_to_back(id, adapter)
        } else {
            self.recycle_in_place(id, depth, adapter)
        }
    }

    fn recycle_to_back<A>(
        &mut self,
        id: SlotId,
        adapter: &mut A,
    ) -> Result<Option<Recycled>, WindowError>
    where
        A: CardAdapter + ?Sized,
    {
        let Some(mut recycled) = self.rotate_to_back(id, adapter)? else {
            return Ok(None);
        };
        let skipped = self.skip_unbound_top(adapter);
        recycled.cursor = self.cursor;
        recycled.bound = self.slot(id)?.bound_index;
        recycled.skipped = skipped.indices;
        recycled.failures.extend(skipped.failures);
        if recycled.advanced() {
            recycled.shown = self.top_binding();
        }
        Ok(Some(recycled))
    }

    fn rotate_to_back<A>(
        &mut self,
        id: SlotId,
        adapter: &mut A,
    ) -> Result<Option<Recycled>, WindowError>
    where
        A: CardAdapter + ?Sized,
    {
        let window_size = self.window_size();
        let back = self.layout.layout_default(window_size - 1).with_opacity(0.0);
        let slot = self.slot_mut(id)?;
        if !slot.exiting {
            return Ok(None);
        }
        slot.exiting = false;
        slot.transform = back;
        self.order.retain(|other| *other != id);
        self.order.push_back(id);

        let previous_cursor = self.cursor;
        if self.cursor + 1 < self.dataset_size {
            self.cursor += 1;
        } else {
            self.exhausted = true;
        }

        // The item entering the window sits just past the old back slot.
        let target = previous_cursor + window_size;
        let dataset_size = self.dataset_size;
        let slot = self.slot_mut(id)?;
        let failure = if target < dataset_size {
            slot.bind(target, adapter).err()
        } else {
            slot.hide();
            None
        };
        let bound = slot.bound_index;

        debug!(
            target: "cardstack.window",
            slot = %id,
            previous_cursor,
            cursor = self.cursor,
            ?bound,
            exhausted = self.exhausted,
            "recycled to back"
        );
        Ok(Some(Recycled {
            slot: id,
            previous_cursor,
            cursor: self.cursor,
            bound,
            failures: failure.into_iter().collect(),
            skipped: Vec::new(),
            shown: None,
        }))
    }

    fn recycle_in_place<A>(
        &mut self,
        id: SlotId,
        depth: usize,
        adapter: &mut A,
    ) -> Result<Option<Recycled>, WindowError>
    where
        A: CardAdapter + ?Sized,
    {
        let target = self.cursor + depth;
        let cursor = self.cursor;
        let dataset_size = self.dataset_size;
        let rest = self.layout.rest_transform(depth);
        let slot = self.slot_mut(id)?;
        if slot.exiting || (slot.visible && slot.bound_index == Some(target)) {
            return Ok(None);
        }
        slot.transform = rest;
        let failure = if target < dataset_size {
            slot.bind(target, adapter).err()
        } else {
            slot.hide();
            None
        };
        Ok(Some(Recycled {
            slot: id,
            previous_cursor: cursor,
            cursor,
            bound: slot.bound_index,
            failures: failure.into_iter().collect(),
            skipped: Vec::new(),
            shown: None,
        }))
    }

    fn top_binding(&self) -> Option<usize> {
        self.top_slot()
            .ok()
            .filter(|slot| slot.visible)
            .and_then(|slot| slot.bound_index)
    }
}
