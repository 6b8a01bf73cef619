#![forbid(unsafe_code)]

//! Consumer-facing notifications.

use serde::{Deserialize, Serialize};

use crate::error::AdapterInconsistency;

/// Side a card leaves the stack through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitDirection {
    Left,
    Right,
}

/// Receiver of card-stack notifications. Every method defaults to a no-op.
pub trait EventSink {
    /// The topmost displayed dataset index changed to `index`.
    fn on_show(&mut self, _index: usize) {}

    /// Item `index` was resolved to leave the stack. Fired at release, before
    /// the exit animation completes.
    fn on_vanish(&mut self, _index: usize, _direction: ExitDirection) {}

    /// The top card was pressed and released without dragging.
    fn on_top_card_tap(&mut self, _index: usize) {}

    /// The adapter misbehaved; the affected slot was hidden.
    fn on_adapter_inconsistency(&mut self, _issue: &AdapterInconsistency) {}
}

/// Discards every notification.
impl EventSink for () {}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CardEvent {
    Show { index: usize },
    Vanish { index: usize, direction: ExitDirection },
    Tap { index: usize },
    AdapterInconsistency { message: String },
}

/// Collects notifications in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<CardEvent>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn events(&self) -> &[CardEvent] {
        &self.events
    }

    /// Drain the recorded events.
    pub fn take(&mut self) -> Vec<CardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Indices passed to `on_show`, in order.
    #[must_use]
    pub fn shown(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|event| match event {
                CardEvent::Show { index } => Some(*index),
                _ => None,
            })
            .collect()
    }

    /// `(index, direction)` pairs passed to `on_vanish`, in order.
    #[must_use]
    pub fn vanished(&self) -> Vec<(usize, ExitDirection)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                CardEvent::Vanish { index, direction } => Some((*index, *direction)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn on_show(&mut self, index: usize) {
        self.events.push(CardEvent::Show { index });
    }

    fn on_vanish(&mut self, index: usize, direction: ExitDirection) {
        self.events.push(CardEvent::Vanish { index, direction });
    }

    fn on_top_card_tap(&mut self, index: usize) {
        self.events.push(CardEvent::Tap { index });
    }

    fn on_adapter_inconsistency(&mut self, issue: &AdapterInconsistency) {
        self.events.push(CardEvent::AdapterInconsistency {
            message: issue.to_string(),
        });
    }
}
