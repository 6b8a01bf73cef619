#![forbid(unsafe_code)]

//! Fixed-duration point-to-point motion.
//!
//! A [`Tween2`] reaches its target after exactly `duration`, following an
//! easing curve. It is the deterministic alternative to [`super::Spring2`]
//! for hosts that prefer predictable settle times over physical feel.

use std::time::Duration;

use super::{EasingFn, Motion, ease_out};
use crate::geometry::{Point, lerp};

/// Eased linear motion between two points.
#[derive(Debug, Clone, Copy)]
pub struct Tween2 {
    from: Point,
    to: Point,
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Tween2 {
    /// Move from `from` to `to` over `duration` with ease-out.
    ///
    /// A zero duration completes on the first `advance`.
    #[must_use]
    pub fn new(from: Point, to: Point, duration: Duration) -> Self {
        Self {
            from,
            to,
            elapsed: Duration::ZERO,
            duration,
            easing: ease_out,
        }
    }

    /// Set the easing curve (builder pattern).
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Linear progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return if self.elapsed.is_zero() { 0.0 } else { 1.0 };
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }
}

impl Motion for Tween2 {
    fn advance(&mut self, dt: Duration) {
        if self.duration.is_zero() {
            if !dt.is_zero() {
                self.elapsed = Duration::from_nanos(1);
            }
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration);
    }

    fn position(&self) -> Point {
        if self.is_complete() {
            return self.to;
        }
        let t = (self.easing)(self.progress());
        Point::new(lerp(self.from.x, self.to.x, t), lerp(self.from.y, self.to.y, t))
    }

    fn target(&self) -> Point {
        self.to
    }

    fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }

    fn finish(&mut self) {
        self.elapsed = self.duration.max(Duration::from_nanos(1));
    }
}
