#![forbid(unsafe_code)]

//! Replay scripts.
//!
//! A script names a dataset size, an optional engine configuration, a list
//! of steps and optional end-state expectations:
//!
//! ```json
//! {
//!   "items": 10,
//!   "steps": [
//!     { "op": "down", "x": 360, "y": 400 },
//!     { "op": "move", "x": 710, "y": 420 },
//!     { "op": "up", "x": 710, "y": 420 },
//!     { "op": "settle" }
//!   ],
//!   "expect": { "cursor": 1, "shown": [1] }
//! }
//! ```
//!
//! Items are named `item-N` with `N` counting up across the whole run, so a
//! `replace` step always yields a new first item.

use std::path::Path;
use std::time::Duration;

use cardstack_core::geometry::{CardTransform, Point, Velocity};
use cardstack_engine::{
    CardEvent, DragController, DragEffect, DragNoopReason, DragPhase, DragTransition, EngineError,
    ExitDirection, PointerEvent, RecordingSink, SlotId, StackConfig, VecAdapter,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{HarnessError, Result};

/// Frame length used by `tick` steps that do not give one.
pub const DEFAULT_FRAME_MS: u64 = 16;
/// Upper bound on frames a single `settle` step may run.
pub const DEFAULT_MAX_SETTLE_FRAMES: u32 = 10_000;

/// A complete replay script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Initial dataset size.
    #[serde(default)]
    pub items: usize,
    #[serde(default)]
    pub config: Option<StackConfig>,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub expect: Option<Expectations>,
}

impl Script {
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|source| HarnessError::Script {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn default_frame_ms() -> u64 {
    DEFAULT_FRAME_MS
}

fn one_frame() -> u32 {
    1
}

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Down {
        x: f32,
        y: f32,
    },
    Move {
        x: f32,
        y: f32,
    },
    Up {
        x: f32,
        y: f32,
        #[serde(default)]
        vx: f32,
        #[serde(default)]
        vy: f32,
    },
    Cancel,
    /// Advance `frames` frames of `ms` milliseconds each.
    Tick {
        #[serde(default = "default_frame_ms")]
        ms: u64,
        #[serde(default = "one_frame")]
        frames: u32,
    },
    /// Tick until nothing is left to animate.
    Settle,
    Dismiss {
        direction: ExitDirection,
    },
    /// Append `count` new items.
    Append {
        count: usize,
    },
    /// Swap the dataset for `count` new items.
    Replace {
        count: usize,
    },
    /// Drop items past `len`.
    Truncate {
        len: usize,
    },
    /// Notify a change without touching the data.
    DataChanged,
}

impl Step {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Down { .. } => "down",
            Self::Move { .. } => "move",
            Self::Up { .. } => "up",
            Self::Cancel => "cancel",
            Self::Tick { .. } => "tick",
            Self::Settle => "settle",
            Self::Dismiss { .. } => "dismiss",
            Self::Append { .. } => "append",
            Self::Replace { .. } => "replace",
            Self::Truncate { .. } => "truncate",
            Self::DataChanged => "data_changed",
        }
    }
}

/// End-state checks. Absent fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expectations {
    pub cursor: Option<usize>,
    pub phase: Option<DragPhase>,
    pub dataset_size: Option<usize>,
    pub exhausted: Option<bool>,
    /// Every `on_show` index, in order.
    pub shown: Option<Vec<usize>>,
    /// Every `on_vanish`, in order.
    pub vanished: Option<Vec<(usize, ExitDirection)>>,
}

/// Replay knobs that are not part of the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Treat rejected commands (dismiss during a drag) as fatal.
    pub strict: bool,
    pub max_settle_frames: u32,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_settle_frames: DEFAULT_MAX_SETTLE_FRAMES,
        }
    }
}

/// What one step did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub op: Step,
    /// Frames ticked by this step.
    #[serde(skip_serializing_if = "is_zero")]
    pub frames: u32,
    /// Last meaningful transition of the step.
    pub transition: Option<DragTransition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<CardEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<String>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// One slot at the end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotSnapshot {
    pub depth: usize,
    pub slot: SlotId,
    pub index: Option<usize>,
    pub visible: bool,
    pub transform: CardTransform,
}

/// End state of a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub cursor: usize,
    pub dataset_size: usize,
    pub phase: DragPhase,
    pub exhausted: bool,
    pub shown: Vec<usize>,
    pub vanished: Vec<(usize, ExitDirection)>,
    pub slots: Vec<SlotSnapshot>,
}

/// Full replay output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub steps: Vec<StepRecord>,
    pub summary: Summary,
}

impl Report {
    /// Compare the summary against `expect`; the first mismatch wins.
    pub fn check(&self, expect: &Expectations) -> Result<()> {
        let summary = &self.summary;
        compare("cursor", expect.cursor, summary.cursor)?;
        compare("phase", expect.phase, summary.phase)?;
        compare("dataset_size", expect.dataset_size, summary.dataset_size)?;
        compare("exhausted", expect.exhausted, summary.exhausted)?;
        compare("shown", expect.shown.clone(), summary.shown.clone())?;
        compare("vanished", expect.vanished.clone(), summary.vanished.clone())?;
        Ok(())
    }
}

fn compare<T: PartialEq + std::fmt::Debug>(
    field: &'static str,
    expected: Option<T>,
    actual: T,
) -> Result<()> {
    match expected {
        Some(expected) if expected != actual => Err(HarnessError::Expectation {
            field,
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }),
        _ => Ok(()),
    }
}

/// A live engine driven by script steps.
pub struct Replay {
    controller: DragController<VecAdapter<String>, RecordingSink>,
    options: ReplayOptions,
    next_item: usize,
    history: Vec<CardEvent>,
    records: Vec<StepRecord>,
}

impl Replay {
    pub fn new(config: StackConfig, items: usize, options: ReplayOptions) -> Result<Self> {
        let names = (0..items).map(item_name).collect();
        let mut controller = DragController::new(config, VecAdapter::new(names), RecordingSink::new())?;
        let history = controller.sink_mut().take();
        Ok(Self {
            controller,
            options,
            next_item: items,
            history,
            records: Vec::new(),
        })
    }

    #[must_use]
    pub fn controller(&self) -> &DragController<VecAdapter<String>, RecordingSink> {
        &self.controller
    }

    /// Run one step and record it.
    pub fn apply(&mut self, step: &Step) -> Result<&StepRecord> {
        let index = self.records.len();
        debug!(target: "cardstack.harness", step = index, op = step.name(), "step");
        let mut frames = 0;
        let mut rejected = None;
        let transition = match *step {
            Step::Down { x, y } => Some(self.pointer(PointerEvent::Down {
                position: Point::new(x, y),
            })),
            Step::Move { x, y } => Some(self.pointer(PointerEvent::Move {
                position: Point::new(x, y),
            })),
            Step::Up { x, y, vx, vy } => Some(self.pointer(PointerEvent::Up {
                position: Point::new(x, y),
                velocity: Velocity::new(vx, vy),
            })),
            Step::Cancel => Some(self.pointer(PointerEvent::Cancel)),
            Step::Tick { ms, frames: count } => {
                let mut last = None;
                for _ in 0..count {
                    last = Some(self.controller.tick(Duration::from_millis(ms)));
                    frames += 1;
                }
                last
            }
            Step::Settle => {
                let (last, ticked) = self.settle(index)?;
                frames = ticked;
                last
            }
            Step::Dismiss { direction } => match self.controller.dismiss(direction) {
                Ok(transition) => Some(transition),
                Err(violation) if self.options.strict => {
                    return Err(EngineError::State(violation).into());
                }
                Err(violation) => {
                    warn!(target: "cardstack.harness", step = index, %violation, "dismiss rejected");
                    rejected = Some(violation.to_string());
                    None
                }
            },
            Step::Append { count } => {
                let names: Vec<_> = self.fresh_items(count);
                self.controller.adapter_mut().extend(names);
                Some(self.controller.append_data(count))
            }
            Step::Replace { count } => {
                let names = self.fresh_items(count);
                self.controller.adapter_mut().replace(names);
                Some(self.controller.notify_data_changed())
            }
            Step::Truncate { len } => {
                self.controller.adapter_mut().truncate(len);
                Some(self.controller.notify_data_changed())
            }
            Step::DataChanged => Some(self.controller.notify_data_changed()),
        };

        let events = self.controller.sink_mut().take();
        self.history.extend(events.iter().cloned());
        self.records.push(StepRecord {
            step: index,
            op: step.clone(),
            frames,
            transition,
            events,
            rejected,
        });
        Ok(&self.records[index])
    }

    fn pointer(&mut self, event: PointerEvent) -> DragTransition {
        self.controller.handle_pointer(event)
    }

    /// Tick until a frame has nothing to animate. Returns the last frame
    /// that did something, or the idle frame when nothing was running.
    fn settle(&mut self, step: usize) -> Result<(Option<DragTransition>, u32)> {
        let mut last_active = None;
        let mut frames = 0u32;
        loop {
            let transition = self.controller.tick(Duration::from_millis(DEFAULT_FRAME_MS));
            frames += 1;
            if transition.effect
                == (DragEffect::Noop {
                    reason: DragNoopReason::NothingToAnimate,
                })
            {
                return Ok((last_active.or(Some(transition)), frames));
            }
            if frames >= self.options.max_settle_frames {
                return Err(HarnessError::SettleTimeout { step, frames });
            }
            last_active = Some(transition);
        }
    }

    fn fresh_items(&mut self, count: usize) -> Vec<String> {
        let start = self.next_item;
        self.next_item += count;
        (start..self.next_item).map(item_name).collect()
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        let window = self.controller.window();
        let shown = self
            .history
            .iter()
            .filter_map(|event| match event {
                CardEvent::Show { index } => Some(*index),
                _ => None,
            })
            .collect();
        let vanished = self
            .history
            .iter()
            .filter_map(|event| match event {
                CardEvent::Vanish { index, direction } => Some((*index, *direction)),
                _ => None,
            })
            .collect();
        Summary {
            cursor: window.cursor(),
            dataset_size: window.dataset_size(),
            phase: self.controller.phase(),
            exhausted: window.is_exhausted(),
            shown,
            vanished,
            slots: window
                .slots()
                .enumerate()
                .map(|(depth, slot)| SlotSnapshot {
                    depth,
                    slot: slot.id(),
                    index: slot.bound_index(),
                    visible: slot.is_visible(),
                    transform: slot.transform(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn into_report(self) -> Report {
        let summary = self.summary();
        Report {
            steps: self.records,
            summary,
        }
    }
}

fn item_name(n: usize) -> String {
    format!("item-{n}")
}

/// Replay `script` start to finish and check its expectations.
///
/// `config` overrides the script's own configuration.
pub fn run_script(
    script: &Script,
    config: Option<StackConfig>,
    options: ReplayOptions,
) -> Result<Report> {
    let config = config
        .or_else(|| script.config.clone())
        .unwrap_or_default();
    let mut replay = Replay::new(config, script.items, options)?;
    for step in &script.steps {
        replay.apply(step)?;
    }
    let report = replay.into_report();
    if let Some(expect) = &script.expect {
        report.check(expect)?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swipe_right() -> Vec<Step> {
        vec![
            Step::Down { x: 360.0, y: 400.0 },
            Step::Move { x: 710.0, y: 420.0 },
            Step::Up {
                x: 710.0,
                y: 420.0,
                vx: 0.0,
                vy: 0.0,
            },
            Step::Settle,
        ]
    }

    #[test]
    fn steps_parse_with_defaults() {
        let script = Script::from_json_str(
            r#"{"items": 3, "steps": [{"op": "tick"}, {"op": "up", "x": 1, "y": 2}]}"#,
        )
        .expect("parse");
        assert_eq!(
            script.steps,
            vec![
                Step::Tick {
                    ms: DEFAULT_FRAME_MS,
                    frames: 1
                },
                Step::Up {
                    x: 1.0,
                    y: 2.0,
                    vx: 0.0,
                    vy: 0.0
                },
            ]
        );
    }

    #[test]
    fn unknown_ops_are_rejected() {
        let err = Script::from_json_str(r#"{"steps": [{"op": "fling"}]}"#).expect_err("bad op");
        assert!(err.to_string().contains("fling"), "{err}");
    }

    #[test]
    fn swipe_records_vanish_then_show() {
        let script = Script {
            items: 5,
            config: None,
            steps: swipe_right(),
            expect: None,
        };
        let report = run_script(&script, None, ReplayOptions::default()).expect("run");
        assert_eq!(
            report.steps[2].events,
            vec![CardEvent::Vanish {
                index: 0,
                direction: ExitDirection::Right
            }]
        );
        assert_eq!(report.steps[3].events, vec![CardEvent::Show { index: 1 }]);
        assert!(report.steps[3].frames > 0);
        assert!(matches!(
            report.steps[3].transition.as_ref().map(|t| &t.effect),
            Some(DragEffect::Settled { cursor: 1, .. })
        ));
        assert_eq!(report.summary.cursor, 1);
        assert_eq!(report.summary.slots.len(), 4);
    }

    #[test]
    fn rejected_dismiss_is_recorded_or_fatal() {
        let mut steps = vec![
            Step::Down { x: 360.0, y: 400.0 },
            Step::Move { x: 460.0, y: 400.0 },
            Step::Dismiss {
                direction: ExitDirection::Left,
            },
        ];
        let script = Script {
            items: 3,
            config: None,
            steps: steps.clone(),
            expect: None,
        };
        let report = run_script(&script, None, ReplayOptions::default()).expect("lenient");
        assert!(report.steps[2].rejected.is_some());
        assert_eq!(report.summary.phase, DragPhase::Dragging);

        steps.push(Step::Cancel);
        let strict = ReplayOptions {
            strict: true,
            ..ReplayOptions::default()
        };
        let err = run_script(
            &Script {
                steps,
                ..script
            },
            None,
            strict,
        )
        .expect_err("strict");
        assert!(matches!(err, HarnessError::Engine(EngineError::State(_))));
    }

    #[test]
    fn expectations_report_first_mismatch() {
        let script = Script {
            items: 5,
            config: None,
            steps: swipe_right(),
            expect: Some(Expectations {
                cursor: Some(1),
                shown: Some(vec![2]),
                ..Expectations::default()
            }),
        };
        let err = run_script(&script, None, ReplayOptions::default()).expect_err("mismatch");
        assert!(
            matches!(err, HarnessError::Expectation { field: "shown", .. }),
            "{err}"
        );
    }

    #[test]
    fn replace_resets_to_new_first_item() {
        let mut steps = swipe_right();
        steps.push(Step::Replace { count: 4 });
        steps.push(Step::Settle);
        let report = run_script(
            &Script {
                items: 5,
                config: None,
                steps,
                expect: Some(Expectations {
                    cursor: Some(0),
                    dataset_size: Some(4),
                    shown: Some(vec![1, 0]),
                    ..Expectations::default()
                }),
            },
            None,
            ReplayOptions::default(),
        )
        .expect("run");
        let top = &report.summary.slots[0];
        assert_eq!(top.index, Some(0));
        assert!((top.transform.opacity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn settle_timeout_is_an_error() {
        let options = ReplayOptions {
            strict: false,
            max_settle_frames: 2,
        };
        let err = run_script(
            &Script {
                items: 5,
                config: None,
                steps: swipe_right(),
                expect: None,
            },
            None,
            options,
        )
        .expect_err("timeout");
        assert!(matches!(
            err,
            HarnessError::SettleTimeout { step: 3, frames: 2 }
        ));
    }
}
