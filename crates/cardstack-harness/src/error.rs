#![forbid(unsafe_code)]

use std::path::PathBuf;

use cardstack_engine::{ConfigError, EngineError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid script {path}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("step {step}: settle did not finish within {frames} frames")]
    SettleTimeout { step: usize, frames: u32 },

    #[error("expectation failed: {field} expected {expected}, got {actual}")]
    Expectation {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl From<ConfigError> for HarnessError {
    fn from(error: ConfigError) -> Self {
        Self::Engine(EngineError::Config(error))
    }
}

impl HarnessError {
    /// Process exit code: 2 for failed expectations, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Expectation { .. } => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HarnessError;
    use cardstack_engine::ConfigError;

    #[test]
    fn expectation_failures_exit_with_two() {
        let error = HarnessError::Expectation {
            field: "cursor",
            expected: "3".into(),
            actual: "1".into(),
        };
        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.to_string(),
            "expectation failed: cursor expected 3, got 1"
        );
    }

    #[test]
    fn config_errors_pass_through_engine_wrapper() {
        let error: HarnessError = ConfigError::EmptyWindow.into();
        assert_eq!(error.exit_code(), 1);
        assert!(error.to_string().contains("window_size"), "{error}");
    }
}
