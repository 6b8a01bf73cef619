#![forbid(unsafe_code)]

//! Card-stack interaction engine.
//!
//! # Role in cardstack
//! `cardstack-engine` turns already-processed pointer events and frame ticks
//! into slot transforms and consumer notifications for a swipeable stack of
//! cards. Rendering, image loading and gesture disambiguation stay with the
//! host.
//!
//! # Pieces
//! - [`StackWindow`]: a fixed pool of recyclable slots sliding over the
//!   dataset.
//! - [`LinkageInterpolator`]: lower cards catching up while the top card
//!   moves.
//! - [`ReleaseClassifier`]: recoil or exit, and where the card goes.
//! - [`DragController`]: the state machine tying them to an adapter and an
//!   event sink.
//!
//! # Example
//! ```
//! use std::time::Duration;
//!
//! use cardstack_core::geometry::{Point, Velocity};
//! use cardstack_engine::{DragController, PointerEvent, RecordingSink, StackConfig, VecAdapter};
//!
//! let adapter = VecAdapter::new((0..10).collect::<Vec<u32>>());
//! let mut stack = DragController::new(StackConfig::default(), adapter, RecordingSink::new())?;
//!
//! let down = Point::new(360.0, 400.0);
//! stack.handle_pointer(PointerEvent::Down { position: down });
//! stack.handle_pointer(PointerEvent::Move { position: Point::new(710.0, 420.0) });
//! stack.handle_pointer(PointerEvent::Up {
//!     position: Point::new(710.0, 420.0),
//!     velocity: Velocity::ZERO,
//! });
//! while stack.phase() != cardstack_engine::DragPhase::Idle {
//!     stack.tick(Duration::from_millis(16));
//! }
//! assert_eq!(stack.cursor(), 1);
//! # Ok::<(), cardstack_engine::ConfigError>(())
//! ```

pub mod adapter;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod linkage;
pub mod release;
pub mod settle;
pub mod window;

pub use adapter::{CardAdapter, ItemKey, VecAdapter};
pub use config::{FadeInConfig, PanelGeometry, ResetPolicy, SettleStrategy, StackConfig};
pub use controller::{
    CaptureRejection, DragController, DragEffect, DragNoopReason, DragPhase, DragSession,
    DragTransition, PointerEvent,
};
pub use error::{
    AdapterError, AdapterInconsistency, ConfigError, EngineError, StateViolation, WindowError,
};
pub use events::{CardEvent, EventSink, ExitDirection, RecordingSink};
pub use linkage::LinkageInterpolator;
pub use release::{ReleaseClassifier, ReleaseOutcome};
pub use window::{CardSlot, Recycled, Refill, RefillMode, Skipped, SlotId, StackLayout, StackWindow};
