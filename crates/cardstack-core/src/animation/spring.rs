#![forbid(unsafe_code)]

//! Two-dimensional damped spring motion.
//!
//! Each axis follows the classical damped spring equation:
//!
//!   a = -stiffness × (position - target) - damping × velocity
//!
//! # Parameters
//!
//! - **stiffness** (k): restoring force. Typical UI range: 100–400.
//! - **damping** (c): velocity drag. `c ≈ 2√k` is critically damped; lower
//!   values give a small bounce on arrival, which is what a recoiling card
//!   wants.
//!
//! # Integration
//!
//! Semi-implicit Euler, subdivided into steps of at most 4ms so that a long
//! frame (or a tick after the host was suspended) does not explode.
//!
//! # Invariants
//!
//! 1. Stiffness is at least 0.1; damping is at least 0.
//! 2. Once at rest, `position() == target()` exactly and velocity is zero.
//! 3. A spring at rest does not move until `retarget()` or `impulse()`.

use std::time::Duration;

use super::Motion;
use crate::geometry::{Point, Velocity};

/// Maximum dt per integration step.
const MAX_STEP_SECS: f32 = 0.004;

/// Distance (units) from the target below which the spring may rest.
const DEFAULT_REST_THRESHOLD: f32 = 0.5;

/// Speed (units/s) below which the spring may rest.
const DEFAULT_VELOCITY_THRESHOLD: f32 = 5.0;

/// Minimum stiffness to prevent degenerate springs.
const MIN_STIFFNESS: f32 = 0.1;

/// Spring tuning, separated from state so configs can carry it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    pub stiffness: f32,
    pub damping: f32,
}

impl Default for SpringParams {
    /// Just under critical damping.
    fn default() -> Self {
        Self {
            stiffness: 170.0,
            damping: 26.0,
        }
    }
}

impl SpringParams {
    /// Critically damped parameters for stiffness `k`.
    #[must_use]
    pub fn critical(k: f32) -> Self {
        let k = k.max(MIN_STIFFNESS);
        Self {
            stiffness: k,
            damping: 2.0 * k.sqrt(),
        }
    }
}

/// A spring pulling a point toward a target.
#[derive(Debug, Clone)]
pub struct Spring2 {
    position: Point,
    velocity: Velocity,
    target: Point,
    stiffness: f32,
    damping: f32,
    rest_threshold: f32,
    velocity_threshold: f32,
    at_rest: bool,
}

impl Spring2 {
    /// Create a spring at `from`, heading to `to`, with default tuning.
    #[must_use]
    pub fn new(from: Point, to: Point) -> Self {
        Self {
            position: from,
            velocity: Velocity::ZERO,
            target: to,
            stiffness: SpringParams::default().stiffness,
            damping: SpringParams::default().damping,
            rest_threshold: DEFAULT_REST_THRESHOLD,
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            at_rest: false,
        }
    }

    /// Apply stiffness and damping (builder pattern).
    #[must_use]
    pub fn with_params(mut self, params: SpringParams) -> Self {
        self.stiffness = params.stiffness.max(MIN_STIFFNESS);
        self.damping = params.damping.max(0.0);
        self
    }

    /// Start with an initial velocity (builder pattern).
    #[must_use]
    pub fn with_velocity(mut self, velocity: Velocity) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the rest distance threshold (builder pattern).
    #[must_use]
    pub fn with_rest_threshold(mut self, threshold: f32) -> Self {
        self.rest_threshold = threshold.abs();
        self
    }

    /// Current velocity.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Stiffness parameter.
    #[inline]
    #[must_use]
    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    /// Damping parameter.
    #[inline]
    #[must_use]
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Change the target. Wakes the spring.
    pub fn retarget(&mut self, target: Point) {
        if target.manhattan_distance(self.target) > 0.0 {
            self.target = target;
            self.at_rest = false;
        }
    }

    /// Add to the velocity. Wakes the spring.
    pub fn impulse(&mut self, delta: Velocity) {
        self.velocity.vx += delta.vx;
        self.velocity.vy += delta.vy;
        self.at_rest = false;
    }

    fn step(&mut self, dt: f32) {
        let ax = -self.stiffness * (self.position.x - self.target.x) - self.damping * self.velocity.vx;
        let ay = -self.stiffness * (self.position.y - self.target.y) - self.damping * self.velocity.vy;
        self.velocity.vx += ax * dt;
        self.velocity.vy += ay * dt;
        self.position.x += self.velocity.vx * dt;
        self.position.y += self.velocity.vy * dt;
    }

    fn settle_if_resting(&mut self) {
        let distance = self.position.manhattan_distance(self.target);
        let speed = self.velocity.vx.abs() + self.velocity.vy.abs();
        if distance < self.rest_threshold && speed < self.velocity_threshold {
            self.position = self.target;
            self.velocity = Velocity::ZERO;
            self.at_rest = true;
        }
    }
}

impl Motion for Spring2 {
    fn advance(&mut self, dt: Duration) {
        if self.at_rest {
            return;
        }
        let mut remaining = dt.as_secs_f32();
        if remaining <= 0.0 {
            return;
        }
        while remaining > 0.0 {
            let step_dt = remaining.min(MAX_STEP_SECS);
            self.step(step_dt);
            remaining -= step_dt;
        }
        self.settle_if_resting();
    }

    fn position(&self) -> Point {
        self.position
    }

    fn target(&self) -> Point {
        self.target
    }

    fn is_complete(&self) -> bool {
        self.at_rest
    }

    fn finish(&mut self) {
        self.position = self.target;
        self.velocity = Velocity::ZERO;
        self.at_rest = true;
    }
}
