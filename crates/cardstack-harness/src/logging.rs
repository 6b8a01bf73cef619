#![forbid(unsafe_code)]

//! Subscriber setup for the harness binary.
//!
//! Engine diagnostics go to stderr so stdout stays a clean report stream.
//! `RUST_LOG` wins over `--log`; both take `EnvFilter` directives such as
//! `cardstack.drag=trace,cardstack.window=debug`.

use tracing_subscriber::EnvFilter;

/// Default directive when neither `RUST_LOG` nor `--log` is given.
pub const DEFAULT_FILTER: &str = "cardstack=info";

/// Output shape for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Build the filter from the environment, falling back to `directives`.
pub fn filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives.unwrap_or(DEFAULT_FILTER)))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(format: LogFormat, directives: Option<&str>) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(directives))
        .with_writer(std::io::stderr)
        .with_target(true);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
