#![forbid(unsafe_code)]

//! Script-driven replay for the cardstack engine.
//!
//! Feeds a JSON list of pointer, tick, command and data steps through a
//! [`cardstack_engine::DragController`] backed by a `Vec` adapter, and
//! reports every transition and notification as JSON.

pub mod cli;
pub mod error;
pub mod logging;
pub mod script;

pub use cli::run_from_env;
pub use error::{HarnessError, Result};
pub use script::{Expectations, Replay, ReplayOptions, Report, Script, Step, run_script};
