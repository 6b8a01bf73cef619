#![forbid(unsafe_code)]

//! Core: geometry value types and motion drivers for card stacks.
//!
//! # Role in cardstack
//! `cardstack-core` is the leaf crate. It owns the plain value types that
//! describe where a card sits ([`geometry::Point`], [`geometry::CardTransform`])
//! and the time-driven primitives that move it ([`animation::Spring2`],
//! [`animation::Tween2`], [`animation::Fade`]).
//!
//! # How it fits in the system
//! `cardstack-engine` consumes these types to run the drag/release state
//! machine. Nothing here knows about slots, adapters, or pointer capture, so
//! the motion drivers can be tested and tuned in isolation.

pub mod animation;
pub mod geometry;

pub use geometry::{CardTransform, Displacement, Point, Rect, Velocity, lerp};
