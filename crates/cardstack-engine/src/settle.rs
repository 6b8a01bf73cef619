#![forbid(unsafe_code)]

//! Settle motion: the animated trip of a released card to its endpoint.

use std::time::Duration;

use cardstack_core::animation::spring::SpringParams;
use cardstack_core::animation::{Motion, Spring2, Tween2};
use cardstack_core::geometry::{Point, Velocity};

use crate::config::SettleStrategy;
use crate::events::ExitDirection;
use crate::window::SlotId;

/// What happens when a settle completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleKind {
    /// Back to rest; nothing else.
    Recoil,
    /// Off screen; the slot is recycled on completion.
    Exit(ExitDirection),
}

/// A card in flight.
#[derive(Debug)]
pub struct Settle {
    pub slot: SlotId,
    pub kind: SettleKind,
    /// Started by a dismiss command rather than a drag release.
    pub programmatic: bool,
    motion: Box<dyn Motion>,
}

impl Settle {
    /// Start a settle for `slot` from `from` to `to` (panel coordinates).
    #[must_use]
    pub fn start(
        strategy: &SettleStrategy,
        slot: SlotId,
        kind: SettleKind,
        from: Point,
        to: Point,
        velocity: Velocity,
    ) -> Self {
        Self {
            slot,
            kind,
            programmatic: false,
            motion: build_motion(strategy, from, to, velocity),
        }
    }

    /// Mark as a dismiss-command settle (builder pattern).
    #[must_use]
    pub fn programmatic(mut self) -> Self {
        self.programmatic = true;
        self
    }

    pub fn advance(&mut self, dt: Duration) {
        self.motion.advance(dt);
    }

    #[must_use]
    pub fn position(&self) -> Point {
        self.motion.position()
    }

    #[must_use]
    pub fn target(&self) -> Point {
        self.motion.target()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.motion.is_complete()
    }

    /// Jump to the endpoint.
    pub fn finish(&mut self) {
        self.motion.finish();
    }

    #[must_use]
    pub fn is_exit(&self) -> bool {
        matches!(self.kind, SettleKind::Exit(_))
    }
}

/// Motion driver for `strategy`. Springs inherit the release velocity;
/// tweens ignore it.
#[must_use]
pub fn build_motion(
    strategy: &SettleStrategy,
    from: Point,
    to: Point,
    velocity: Velocity,
) -> Box<dyn Motion> {
    match *strategy {
        SettleStrategy::Spring { stiffness, damping } => Box::new(
            Spring2::new(from, to)
                .with_params(SpringParams { stiffness, damping })
                .with_velocity(velocity),
        ),
        SettleStrategy::Tween {
            duration_ms,
            easing,
        } => Box::new(
            Tween2::new(from, to, Duration::from_millis(duration_ms)).easing(easing.function()),
        ),
    }
}
