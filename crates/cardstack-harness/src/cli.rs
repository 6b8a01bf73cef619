#![forbid(unsafe_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use cardstack_engine::StackConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use crate::error::{HarnessError, Result};
use crate::logging::{self, LogFormat};
use crate::script::{DEFAULT_MAX_SETTLE_FRAMES, ReplayOptions, Script, run_script};

#[derive(Debug, Parser)]
#[command(
    name = "cardstack-harness",
    about = "Replay pointer scripts against the cardstack interaction engine",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log line format on stderr.
    #[arg(long, value_enum, default_value_t, global = true)]
    pub log_format: LogFormat,

    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    pub log: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a JSON script and print the report.
    Run(RunArgs),

    /// Validate a configuration file and print the effective values.
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Script to replay.
    pub script: PathBuf,

    /// Engine configuration (TOML, or JSON by extension). Overrides the
    /// script's own `config`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pretty-print the report.
    #[arg(long)]
    pub pretty: bool,

    /// Fail on rejected commands instead of recording them.
    #[arg(long)]
    pub strict: bool,

    #[arg(long, default_value_t = DEFAULT_MAX_SETTLE_FRAMES)]
    pub max_settle_frames: u32,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Configuration to check; the defaults when omitted.
    pub path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    pub format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format, cli.log.as_deref());
    run(cli, &mut std::io::stdout().lock())
}

pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_replay(&args, out),
        Commands::Config(args) => print_config(&args, out),
    }
}

/// Load a configuration, picking the format from the extension.
pub fn load_config(path: &Path) -> Result<StackConfig> {
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => StackConfig::from_json_file(path)?,
        Some("toml") | None => StackConfig::from_toml_file(path)?,
        Some(other) => {
            return Err(HarnessError::invalid(format!(
                "unsupported config extension `.{other}` (expected .toml or .json)"
            )));
        }
    };
    config.validate()?;
    Ok(config)
}

fn run_replay(args: &RunArgs, out: &mut impl Write) -> Result<()> {
    let script = Script::from_file(&args.script)?;
    let config = args.config.as_deref().map(load_config).transpose()?;
    let options = ReplayOptions {
        strict: args.strict,
        max_settle_frames: args.max_settle_frames,
    };
    info!(
        target: "cardstack.harness",
        script = %args.script.display(),
        steps = script.steps.len(),
        items = script.items,
        "replaying"
    );
    let report = run_script(&script, config, options)?;
    if args.pretty {
        serde_json::to_writer_pretty(&mut *out, &report)?;
    } else {
        serde_json::to_writer(&mut *out, &report)?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_config(args: &ConfigArgs, out: &mut impl Write) -> Result<()> {
    let config = match &args.path {
        Some(path) => load_config(path)?,
        None => StackConfig::default(),
    };
    match args.format {
        ConfigFormat::Toml => write!(out, "{}", toml::to_string_pretty(&config)?)?,
        ConfigFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?,
    }
    Ok(())
}
