#![forbid(unsafe_code)]

//! Time-driven animation primitives.
//!
//! Two families live here:
//!
//! - **Scalar animations** ([`Animation`]): a normalized progress value in
//!   `[0.0, 1.0]`, used for opacity fades ([`Fade`], [`Delayed`]).
//! - **Motions** ([`Motion`]): a 2-D position travelling toward a target
//!   point, used to settle a released card ([`Spring2`], [`Tween2`]).
//!
//! Both are advanced explicitly by the host's frame loop with a
//! [`Duration`]; nothing here reads a clock.
//!
//! # Invariants
//!
//! 1. `value()` is always within `[0.0, 1.0]`.
//! 2. A completed animation or motion stays complete until `reset()` or a new
//!    target is set.
//! 3. `Motion::finish()` leaves `position() == target()` and
//!    `is_complete() == true`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

pub mod spring;
pub mod tween;

pub use spring::Spring2;
pub use tween::Tween2;

/// A scalar animation producing normalized progress.
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current progress in `[0.0, 1.0]`.
    fn value(&self) -> f32;

    /// Return to the initial state.
    fn reset(&mut self);
}

/// A 2-D motion toward a target point.
///
/// Any driver that reaches its target, reports completion, and can be cut
/// short with [`finish`](Motion::finish) is a valid settle strategy.
pub trait Motion: fmt::Debug {
    /// Advance by `dt`.
    fn advance(&mut self, dt: Duration);

    /// Current position.
    fn position(&self) -> Point;

    /// Where the motion ends.
    fn target(&self) -> Point;

    /// Whether the motion has arrived.
    fn is_complete(&self) -> bool;

    /// Jump straight to the target.
    fn finish(&mut self);
}

/// Easing curve signature: maps linear progress to eased progress.
pub type EasingFn = fn(f32) -> f32;

/// Identity easing.
#[must_use]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in.
#[must_use]
pub fn ease_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic ease-out.
#[must_use]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out.
#[must_use]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-out.
#[must_use]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Named easing curve, for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    #[default]
    EaseOut,
    EaseInOut,
    EaseOutCubic,
}

impl Easing {
    /// The curve as a function pointer.
    #[must_use]
    pub fn function(self) -> EasingFn {
        match self {
            Self::Linear => linear,
            Self::EaseIn => ease_in,
            Self::EaseOut => ease_out,
            Self::EaseInOut => ease_in_out,
            Self::EaseOutCubic => ease_out_cubic,
        }
    }
}

/// Fixed-duration 0 → 1 fade.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Fade {
    /// Fade over `duration` with linear easing. Zero is clamped to 1ns.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: duration.max(Duration::from_nanos(1)),
            easing: linear,
        }
    }

    /// Set the easing curve (builder pattern).
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Linear progress before easing.
    #[must_use]
    pub fn raw_progress(&self) -> f32 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }
}

impl Animation for Fade {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(self.raw_progress()).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

/// An animation that holds at 0 for `delay` before running `inner`.
#[derive(Debug, Clone)]
pub struct Delayed<A> {
    delay: Duration,
    waited: Duration,
    inner: A,
}

/// Wrap `inner` so it starts after `delay`.
#[must_use]
pub fn delay<A: Animation>(delay: Duration, inner: A) -> Delayed<A> {
    Delayed {
        delay,
        waited: Duration::ZERO,
        inner,
    }
}

impl<A: Animation> Delayed<A> {
    /// Whether the delay has elapsed.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.waited >= self.delay
    }
}

impl<A: Animation> Animation for Delayed<A> {
    fn tick(&mut self, dt: Duration) {
        let remaining = self.delay.saturating_sub(self.waited);
        if dt <= remaining {
            self.waited += dt;
            return;
        }
        self.waited = self.delay;
        self.inner.tick(dt - remaining);
    }

    fn is_complete(&self) -> bool {
        self.has_started() && self.inner.is_complete()
    }

    fn value(&self) -> f32 {
        if self.has_started() {
            self.inner.value()
        } else {
            0.0
        }
    }

    fn reset(&mut self) {
        self.waited = Duration::ZERO;
        self.inner.reset();
    }
}
