#![forbid(unsafe_code)]

//! Error taxonomy for the card-stack engine.
//!
//! - [`ConfigError`]: fatal at construction.
//! - [`WindowError`]: slot lookups outside the window.
//! - [`StateViolation`]: a command issued in an incompatible phase; the
//!   caller waits for the current settle to finish and retries.
//! - [`AdapterInconsistency`]: the data adapter misbehaved. Never returned as
//!   `Err` from the interaction loop; the engine hides the affected slot,
//!   logs, and forwards the issue to the event sink.

use std::path::PathBuf;

use thiserror::Error;

use crate::window::SlotId;

/// Invalid or unreadable [`crate::StackConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("window_size must be > 0")]
    EmptyWindow,
    #[error("{field} must be > 0 (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be >= 0 (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("scale_step {scale_step} collapses the deepest visible card (2 * scale_step must be < 1)")]
    ScaleCollapse { scale_step: f32 },
    #[error("card {card_width}x{card_height} does not fit panel {panel_width}x{panel_height}")]
    CardExceedsPanel {
        card_width: f32,
        card_height: f32,
        panel_width: f32,
        panel_height: f32,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Slot lookup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("stack window has no slots")]
    EmptyWindow,
    #[error("depth {depth} is outside a window of {window_size} slots")]
    DepthOutOfRange { depth: usize, window_size: usize },
    #[error("{0} does not belong to this window")]
    UnknownSlot(SlotId),
}

/// A command was issued in a phase that cannot accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateViolation {
    #[error("an exit animation is already settling")]
    ExitAlreadySettling,
    #[error("the top card is being dragged")]
    DragInProgress,
}

/// Failure reported by [`crate::CardAdapter::bind_view`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AdapterError {
    message: String,
}

impl AdapterError {
    /// Create an adapter error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message supplied by the adapter.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The data adapter disagreed with the engine's view of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterInconsistency {
    #[error("binding {slot} to item {index} failed: {source}")]
    BindFailed {
        slot: SlotId,
        index: usize,
        #[source]
        source: AdapterError,
    },
    #[error("adapter count shrank from {observed} to {reported}")]
    CountShrank { observed: usize, reported: usize },
    #[error("item {index} reached the top without a view; skipped")]
    ItemSkipped { index: usize },
}

/// Umbrella error for engine entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("window error: {0}")]
    Window(#[from] WindowError),
    #[error("state violation: {0}")]
    State(#[from] StateViolation),
}
