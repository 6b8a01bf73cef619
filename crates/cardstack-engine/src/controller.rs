#![forbid(unsafe_code)]

//! Drag lifecycle state machine.
//!
//! ```text
//! Idle -> Captured -> Dragging -> Settling -> Idle
//!            \-> Idle (tap or cancel)
//! Idle -> Settling (dismiss command)
//! ```
//!
//! Every entry point returns a [`DragTransition`] describing what happened,
//! including explicit [`DragEffect::Noop`] diagnostics for ignored input.
//! All calls must come from one thread of control; the host serializes
//! pointer events and frame ticks.
//!
//! A pointer-down that arrives while a released card is still settling first
//! runs that settle to its end (including the recycle of an exiting card and
//! its notifications) and only then considers the new capture. Settles
//! started by [`DragController::dismiss`] lock out captures until they
//! complete.

use std::time::Duration;

use cardstack_core::animation::{Animation, Delayed, Fade, delay, ease_out};
use cardstack_core::geometry::{Displacement, Point, Velocity};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::adapter::CardAdapter;
use crate::config::{ResetPolicy, StackConfig};
use crate::error::{ConfigError, StateViolation};
use crate::events::{EventSink, ExitDirection};
use crate::linkage::LinkageInterpolator;
use crate::release::{ReleaseClassifier, ReleaseOutcome};
use crate::settle::{Settle, SettleKind};
use crate::window::{RefillMode, STACK_VISIBLE_DEPTH, SlotId, StackLayout, StackWindow};

/// Tolerance for "at full scale and opacity" when capturing.
const REST_EPSILON: f32 = 1e-3;

/// Already-processed pointer input, in panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point, velocity: Velocity },
    /// The host lost the pointer (gesture stolen, window blurred).
    Cancel,
}

/// Coarse lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Idle,
    Captured,
    Dragging,
    Settling,
}

/// State of one pointer interaction with the top card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DragSession {
    pub slot: SlotId,
    /// Dataset index shown by the captured slot.
    pub index: usize,
    pub down: Point,
    /// Slot offset when the pointer went down.
    pub origin_offset: Displacement,
}

impl DragSession {
    /// Slot offset for a pointer at `position`.
    #[must_use]
    pub fn offset_at(&self, position: Point) -> Displacement {
        self.origin_offset + (position - self.down)
    }
}

#[derive(Debug)]
enum DragState {
    Idle,
    Captured(DragSession),
    Dragging(DragSession),
    Settling(Settle),
}

impl DragState {
    fn phase(&self) -> DragPhase {
        match self {
            Self::Idle => DragPhase::Idle,
            Self::Captured(_) => DragPhase::Captured,
            Self::Dragging(_) => DragPhase::Dragging,
            Self::Settling(_) => DragPhase::Settling,
        }
    }
}

/// Why a pointer-down did not capture the top card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureRejection {
    EmptyDataset,
    TopSlotHidden,
    /// The top card is still scaling or fading into place.
    SlotMidTransition,
    OutsideDraggableRegion,
    /// A dismiss command is animating.
    Locked,
}

/// Explicit no-op diagnostics for input that is safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    NoActiveSession,
    ActiveDragInProgress,
    BelowSlop,
    /// Queued until the controller is idle again.
    Deferred,
    NothingToDismiss,
    NothingToAnimate,
}

/// Effect emitted by one controller step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Captured {
        slot: SlotId,
        index: usize,
    },
    CaptureRejected {
        reason: CaptureRejection,
    },
    DragStarted {
        slot: SlotId,
        displacement: Displacement,
    },
    DragMoved {
        displacement: Displacement,
    },
    Tapped {
        index: usize,
    },
    Released {
        outcome: ReleaseOutcome,
    },
    Dismissed {
        index: usize,
        direction: ExitDirection,
        endpoint: Point,
    },
    Canceled {
        /// A dragged card was sent back to rest.
        recoiling: bool,
    },
    SettleAdvanced {
        position: Point,
    },
    Settled {
        exited: Option<ExitDirection>,
        cursor: usize,
    },
    FadesAdvanced {
        active: usize,
    },
    DataRefreshed {
        reset: bool,
        cursor: usize,
    },
    Noop {
        reason: DragNoopReason,
    },
}

/// One state-machine step with diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragPhase,
    pub to: DragPhase,
    pub effect: DragEffect,
    /// A pending settle was run to completion before handling the input.
    pub flushed_settle: bool,
}

#[derive(Debug)]
struct SlotFade {
    slot: SlotId,
    fade: Delayed<Fade>,
}

/// Orchestrates window, linkage, classifier and settle motion for one stack.
pub struct DragController<A: CardAdapter, S: EventSink> {
    config: StackConfig,
    window: StackWindow,
    linkage: LinkageInterpolator,
    classifier: ReleaseClassifier,
    adapter: A,
    sink: S,
    state: DragState,
    fades: Vec<SlotFade>,
    first_item: Option<A::ItemId>,
    pending_data_change: bool,
    pending_fill: bool,
    transition_counter: u64,
}

impl<A: CardAdapter, S: EventSink> DragController<A, S> {
    /// Validate `config`, build the window and bind the first cards.
    ///
    /// No `on_show` is fired for the initial top card.
    pub fn new(config: StackConfig, mut adapter: A, mut sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut window = StackWindow::new(config.window_size, StackLayout::from_config(&config))
            .map_err(|_| ConfigError::EmptyWindow)?;
        for issue in window.populate(&mut adapter) {
            sink.on_adapter_inconsistency(&issue);
        }
        let first_item = adapter.item_at(0);
        debug!(
            target: "cardstack.drag",
            window_size = config.window_size,
            dataset_size = window.dataset_size(),
            "controller ready"
        );
        Ok(Self {
            linkage: LinkageInterpolator::from_config(&config),
            classifier: ReleaseClassifier::from_config(&config),
            config,
            window,
            adapter,
            sink,
            state: DragState::Idle,
            fades: Vec::new(),
            first_item,
            pending_data_change: false,
            pending_fill: false,
            transition_counter: 0,
        })
    }

    #[must_use]
    pub fn phase(&self) -> DragPhase {
        self.state.phase()
    }

    /// Active pointer session, if any.
    #[must_use]
    pub fn session(&self) -> Option<DragSession> {
        match &self.state {
            DragState::Captured(session) | DragState::Dragging(session) => Some(*session),
            DragState::Idle | DragState::Settling(_) => None,
        }
    }

    /// A dismiss command is in flight; captures are refused.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(&self.state, DragState::Settling(settle) if settle.programmatic)
    }

    fn exit_in_flight(&self) -> bool {
        matches!(&self.state, DragState::Settling(settle) if settle.is_exit())
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.window.cursor()
    }

    #[must_use]
    pub fn window(&self) -> &StackWindow {
        &self.window
    }

    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Mutable adapter access. Follow changes with
    /// [`notify_data_changed`](Self::notify_data_changed) or
    /// [`append_data`](Self::append_data).
    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Tear down, returning the adapter and sink.
    pub fn into_parts(self) -> (A, S) {
        (self.adapter, self.sink)
    }

    /// Apply one pointer event.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> DragTransition {
        let from = self.phase();
        match event {
            PointerEvent::Down { position } => self.pointer_down(from, position),
            PointerEvent::Move { position } => self.pointer_move(from, position),
            PointerEvent::Up { position, velocity } => self.pointer_up(from, position, velocity),
            PointerEvent::Cancel => self.pointer_cancel(from),
        }
    }

    /// Advance animations by one frame.
    pub fn tick(&mut self, dt: Duration) -> DragTransition {
        let from = self.phase();
        self.advance_fades(dt);

        let progress = match &mut self.state {
            DragState::Settling(settle) => {
                settle.advance(dt);
                Some((settle.slot, settle.position(), settle.is_complete()))
            }
            _ => None,
        };
        let effect = match progress {
            Some((slot, position, complete)) => {
                self.place_flying_slot(slot, position);
                if complete {
                    self.complete_settle()
                } else {
                    trace!(target: "cardstack.drag", %slot, x = position.x, y = position.y, "settle tick");
                    DragEffect::SettleAdvanced { position }
                }
            }
            None if !self.fades.is_empty() => DragEffect::FadesAdvanced {
                active: self.fades.len(),
            },
            None => DragEffect::Noop {
                reason: DragNoopReason::NothingToAnimate,
            },
        };
        self.transition(from, effect, false)
    }

    /// Send the top card off screen without a drag.
    ///
    /// A recoil still in flight is cut short first. Fails while the top card
    /// is held by the pointer or another exit is settling.
    pub fn dismiss(&mut self, direction: ExitDirection) -> Result<DragTransition, StateViolation> {
        let from = self.phase();
        let flushed = match from {
            DragPhase::Captured | DragPhase::Dragging => {
                return Err(StateViolation::DragInProgress);
            }
            DragPhase::Settling if self.exit_in_flight() => {
                return Err(StateViolation::ExitAlreadySettling);
            }
            DragPhase::Settling => {
                self.flush_settle();
                true
            }
            DragPhase::Idle => false,
        };

        let target = self
            .window
            .top_slot()
            .ok()
            .filter(|top| top.is_visible())
            .and_then(|top| {
                top.bound_index()
                    .map(|index| (top.id(), index, top.transform().offset()))
            });
        let Some((slot, index, offset)) = target else {
            return Ok(self.transition(
                from,
                DragEffect::Noop {
                    reason: DragNoopReason::NothingToDismiss,
                },
                flushed,
            ));
        };

        let endpoint = self.classifier.dismiss_endpoint(direction);
        let start = self.classifier.rest_origin() + offset;
        self.mark_exiting(slot);
        debug!(target: "cardstack.drag", %slot, index, ?direction, "dismiss");
        self.sink.on_vanish(index, direction);
        self.state = DragState::Settling(
            Settle::start(
                &self.config.settle,
                slot,
                SettleKind::Exit(direction),
                start,
                endpoint,
                Velocity::ZERO,
            )
            .programmatic(),
        );
        Ok(self.transition(
            from,
            DragEffect::Dismissed {
                index,
                direction,
                endpoint,
            },
            flushed,
        ))
    }

    /// The adapter's contents changed. Processed immediately when idle,
    /// otherwise once the current interaction ends.
    pub fn notify_data_changed(&mut self) -> DragTransition {
        let from = self.phase();
        if from != DragPhase::Idle {
            self.pending_data_change = true;
            return self.transition(
                from,
                DragEffect::Noop {
                    reason: DragNoopReason::Deferred,
                },
                false,
            );
        }
        let reset = self.refresh_data();
        let cursor = self.window.cursor();
        self.transition(from, DragEffect::DataRefreshed { reset, cursor }, false)
    }

    /// `added` items were appended to the adapter.
    pub fn append_data(&mut self, added: usize) -> DragTransition {
        let from = self.phase();
        self.window.append_data(added);
        if from != DragPhase::Idle {
            self.pending_fill = true;
            return self.transition(
                from,
                DragEffect::Noop {
                    reason: DragNoopReason::Deferred,
                },
                false,
            );
        }
        self.fill();
        let cursor = self.window.cursor();
        self.transition(
            from,
            DragEffect::DataRefreshed {
                reset: false,
                cursor,
            },
            false,
        )
    }

    fn pointer_down(&mut self, from: DragPhase, position: Point) -> DragTransition {
        let flushed = match from {
            DragPhase::Captured | DragPhase::Dragging => {
                return self.transition(
                    from,
                    DragEffect::Noop {
                        reason: DragNoopReason::ActiveDragInProgress,
                    },
                    false,
                );
            }
            DragPhase::Settling if self.is_locked() => {
                return self.transition(
                    from,
                    DragEffect::CaptureRejected {
                        reason: CaptureRejection::Locked,
                    },
                    false,
                );
            }
            DragPhase::Settling => {
                self.flush_settle();
                true
            }
            DragPhase::Idle => false,
        };

        let effect = match self.try_capture(position) {
            Ok(session) => {
                debug!(
                    target: "cardstack.drag",
                    slot = %session.slot,
                    index = session.index,
                    x = position.x,
                    y = position.y,
                    "captured"
                );
                self.state = DragState::Captured(session);
                DragEffect::Captured {
                    slot: session.slot,
                    index: session.index,
                }
            }
            Err(reason) => {
                debug!(target: "cardstack.drag", ?reason, "capture rejected");
                DragEffect::CaptureRejected { reason }
            }
        };
        self.transition(from, effect, flushed)
    }

    fn try_capture(&self, position: Point) -> Result<DragSession, CaptureRejection> {
        if self.window.dataset_size() == 0 {
            return Err(CaptureRejection::EmptyDataset);
        }
        let top = self
            .window
            .top_slot()
            .map_err(|_| CaptureRejection::TopSlotHidden)?;
        let index = match top.bound_index() {
            Some(index) if top.is_visible() => index,
            _ => return Err(CaptureRejection::TopSlotHidden),
        };
        let transform = top.transform();
        if (transform.scale_x - 1.0).abs() > REST_EPSILON
            || (transform.scale_y - 1.0).abs() > REST_EPSILON
            || transform.opacity < 1.0 - REST_EPSILON
        {
            return Err(CaptureRejection::SlotMidTransition);
        }

        let card_origin = self.classifier.rest_origin() + transform.offset();
        let hit_area = match self.adapter.draggable_region(top.id()) {
            Some(region) => region.translate(card_origin - Point::ORIGIN),
            None => self.config.panel.card_bounds_at(card_origin),
        };
        if !hit_area.contains(position) {
            return Err(CaptureRejection::OutsideDraggableRegion);
        }
        Ok(DragSession {
            slot: top.id(),
            index,
            down: position,
            origin_offset: transform.offset(),
        })
    }

    fn pointer_move(&mut self, from: DragPhase, position: Point) -> DragTransition {
        let effect = match (from, self.session()) {
            (DragPhase::Captured, Some(session)) => {
                if (position - session.down).manhattan() <= self.config.touch_slop {
                    DragEffect::Noop {
                        reason: DragNoopReason::BelowSlop,
                    }
                } else {
                    self.state = DragState::Dragging(session);
                    let displacement = self.drag_to(&session, position);
                    debug!(target: "cardstack.drag", slot = %session.slot, dx = displacement.dx, dy = displacement.dy, "drag started");
                    DragEffect::DragStarted {
                        slot: session.slot,
                        displacement,
                    }
                }
            }
            (DragPhase::Dragging, Some(session)) => {
                let displacement = self.drag_to(&session, position);
                trace!(target: "cardstack.drag", dx = displacement.dx, dy = displacement.dy, "drag moved");
                DragEffect::DragMoved { displacement }
            }
            _ => DragEffect::Noop {
                reason: DragNoopReason::NoActiveSession,
            },
        };
        self.transition(from, effect, false)
    }

    fn pointer_up(&mut self, from: DragPhase, position: Point, velocity: Velocity) -> DragTransition {
        let Some(session) = self.session() else {
            return self.transition(
                from,
                DragEffect::Noop {
                    reason: DragNoopReason::NoActiveSession,
                },
                false,
            );
        };
        let is_tap = from == DragPhase::Captured
            && (position - session.down).manhattan() <= self.config.touch_slop;
        if is_tap {
            self.state = DragState::Idle;
            debug!(target: "cardstack.drag", index = session.index, "tap");
            self.sink.on_top_card_tap(session.index);
            self.run_pending();
            return self.transition(from, DragEffect::Tapped { index: session.index }, false);
        }

        let displacement = self.drag_to(&session, position);
        let outcome = self.classifier.classify(velocity, displacement);
        debug!(
            target: "cardstack.drag",
            slot = %session.slot,
            dx = displacement.dx,
            dy = displacement.dy,
            vx = velocity.vx,
            vy = velocity.vy,
            ?outcome,
            "released"
        );
        let (kind, endpoint) = match (outcome.direction(), outcome.endpoint()) {
            (Some(direction), Some(endpoint)) => {
                self.mark_exiting(session.slot);
                self.sink.on_vanish(session.index, direction);
                (SettleKind::Exit(direction), endpoint)
            }
            _ => (SettleKind::Recoil, self.classifier.rest_origin()),
        };
        self.state = DragState::Settling(Settle::start(
            &self.config.settle,
            session.slot,
            kind,
            self.classifier.rest_origin() + displacement,
            endpoint,
            velocity,
        ));
        self.transition(from, DragEffect::Released { outcome }, false)
    }

    fn pointer_cancel(&mut self, from: DragPhase) -> DragTransition {
        let effect = match (from, self.session()) {
            (DragPhase::Captured, Some(_)) => {
                self.state = DragState::Idle;
                self.run_pending();
                DragEffect::Canceled { recoiling: false }
            }
            (DragPhase::Dragging, Some(session)) => {
                let offset = self
                    .window
                    .slot(session.slot)
                    .map(|slot| slot.transform().offset())
                    .unwrap_or(Displacement::ZERO);
                let rest = self.classifier.rest_origin();
                self.state = DragState::Settling(Settle::start(
                    &self.config.settle,
                    session.slot,
                    SettleKind::Recoil,
                    rest + offset,
                    rest,
                    Velocity::ZERO,
                ));
                debug!(target: "cardstack.drag", slot = %session.slot, "drag canceled; recoiling");
                DragEffect::Canceled { recoiling: true }
            }
            _ => DragEffect::Noop {
                reason: DragNoopReason::NoActiveSession,
            },
        };
        self.transition(from, effect, false)
    }

    /// Move the captured slot under the pointer and update linkage.
    fn drag_to(&mut self, session: &DragSession, position: Point) -> Displacement {
        let offset = session.offset_at(position);
        self.set_top_offset(session.slot, offset);
        offset
    }

    fn place_flying_slot(&mut self, slot: SlotId, position: Point) {
        let offset = position - self.classifier.rest_origin();
        self.set_top_offset(slot, offset);
    }

    fn set_top_offset(&mut self, slot: SlotId, offset: Displacement) {
        if let Ok(current) = self.window.slot(slot).map(|slot| slot.transform()) {
            self.window.set_transform(slot, current.with_offset(offset));
        }
        self.linkage.apply(&mut self.window, offset);
    }

    fn mark_exiting(&mut self, slot: SlotId) {
        if let Err(err) = self.window.begin_exit(slot) {
            warn!(target: "cardstack.drag", %slot, error = %err, "cannot mark slot as exiting");
        }
    }

    /// Jump the current settle to its endpoint and run its completion.
    fn flush_settle(&mut self) {
        if let DragState::Settling(settle) = &mut self.state {
            settle.finish();
            let (slot, position) = (settle.slot, settle.position());
            debug!(target: "cardstack.drag", %slot, "flushing settle");
            self.place_flying_slot(slot, position);
            self.complete_settle();
        }
    }

    /// Leave `Settling`: recycle an exited slot, snap the stack to rest and
    /// run deferred data work.
    fn complete_settle(&mut self) -> DragEffect {
        let DragState::Settling(settle) = std::mem::replace(&mut self.state, DragState::Idle)
        else {
            return DragEffect::Noop {
                reason: DragNoopReason::NothingToAnimate,
            };
        };

        let exited = match settle.kind {
            SettleKind::Recoil => None,
            SettleKind::Exit(direction) => {
                self.fades.retain(|fade| fade.slot != settle.slot);
                match self.window.recycle(settle.slot, true, &mut self.adapter) {
                    Ok(Some(recycled)) => {
                        for issue in &recycled.failures {
                            self.sink.on_adapter_inconsistency(issue);
                        }
                        if let Some(index) = recycled.shown {
                            self.sink.on_show(index);
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(target: "cardstack.drag", slot = %settle.slot, error = %err, "recycle failed");
                    }
                }
                Some(direction)
            }
        };
        self.snap_to_rest();
        if let Some(direction) = exited
            && let Some(depth) = self.window.depth_of(settle.slot)
            && depth < STACK_VISIBLE_DEPTH
            && self
                .window
                .slot(settle.slot)
                .is_ok_and(|slot| slot.is_visible())
        {
            // Small windows recycle straight into a visible layer.
            self.start_fades(&[(settle.slot, depth)]);
            trace!(target: "cardstack.drag", ?direction, depth, "recycled slot fading in");
        }
        debug!(
            target: "cardstack.drag",
            slot = %settle.slot,
            ?exited,
            cursor = self.window.cursor(),
            "settled"
        );
        self.run_pending();
        DragEffect::Settled {
            exited,
            cursor: self.window.cursor(),
        }
    }

    /// Put every slot that is not in flight at its resting transform,
    /// keeping the opacity of slots that are fading in.
    fn snap_to_rest(&mut self) {
        let layout = *self.window.layout();
        let resting: Vec<_> = self
            .window
            .slots()
            .enumerate()
            .filter(|(_, slot)| !slot.is_exiting())
            .map(|(depth, slot)| (slot.id(), depth, slot.transform().opacity))
            .collect();
        for (id, depth, opacity) in resting {
            let mut rest = layout.rest_transform(depth);
            if self.fades.iter().any(|fade| fade.slot == id) {
                rest = rest.with_opacity(opacity);
            }
            self.window.set_transform(id, rest);
        }
    }

    fn run_pending(&mut self) {
        if std::mem::take(&mut self.pending_data_change) {
            self.pending_fill = false;
            self.refresh_data();
        } else if std::mem::take(&mut self.pending_fill) {
            self.fill();
        }
    }

    /// Re-read the adapter: detect shrinkage and dataset replacement, then
    /// rebind the window. Returns whether the cursor was reset.
    fn refresh_data(&mut self) -> bool {
        if let Some(issue) = self.window.sync_dataset_size(self.adapter.count()) {
            self.sink.on_adapter_inconsistency(&issue);
        }
        let first = self.adapter.item_at(0);
        let replaced = self.config.reset_policy == ResetPolicy::FirstItemIdentity
            && first.is_some()
            && first != self.first_item;
        if replaced {
            debug!(target: "cardstack.drag", previous = ?self.first_item, current = ?first, "first item changed; resetting");
        }
        self.first_item = first;
        self.apply_refill(if replaced {
            RefillMode::Reset
        } else {
            RefillMode::Rebind
        });
        replaced
    }

    fn fill(&mut self) {
        self.apply_refill(RefillMode::Fill);
    }

    fn apply_refill(&mut self, mode: RefillMode) {
        let refill = self.window.refill(mode, &mut self.adapter);
        for issue in &refill.failures {
            self.sink.on_adapter_inconsistency(issue);
        }
        // Skipped items shift the window; fade by the depth a slot ended at.
        let revealed: Vec<_> = refill
            .revealed
            .iter()
            .filter_map(|&(slot, _)| {
                let depth = self.window.depth_of(slot)?;
                self.window
                    .slot(slot)
                    .is_ok_and(|card| card.is_visible())
                    .then_some((slot, depth))
            })
            .collect();
        self.start_fades(&revealed);
        if let Some(index) = refill.shown {
            self.sink.on_show(index);
        }
    }

    /// Fade visible layers in, top first, staggered. Spares stay transparent
    /// until linkage reveals them.
    fn start_fades(&mut self, revealed: &[(SlotId, usize)]) {
        let duration = self.config.fade_in.duration();
        let stagger = self.config.fade_in.stagger();
        let mut order = 0u32;
        for &(slot, depth) in revealed {
            if depth >= STACK_VISIBLE_DEPTH {
                continue;
            }
            self.window.set_opacity(slot, 0.0);
            self.fades.retain(|fade| fade.slot != slot);
            self.fades.push(SlotFade {
                slot,
                fade: delay(stagger * order, Fade::new(duration).easing(ease_out)),
            });
            order += 1;
        }
    }

    fn advance_fades(&mut self, dt: Duration) {
        for fade in &mut self.fades {
            fade.fade.tick(dt);
            self.window.set_opacity(fade.slot, fade.fade.value());
        }
        self.fades.retain(|fade| !fade.fade.is_complete());
    }

    fn transition(&mut self, from: DragPhase, effect: DragEffect, flushed_settle: bool) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        DragTransition {
            transition_id: self.transition_counter,
            from,
            to: self.phase(),
            effect,
            flushed_settle,
        }
    }
}
