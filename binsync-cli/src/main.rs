//! binsync — stage a directory of binaries into shared target directories.
//!
//! # Usage
//!
//! ```text
//! binsync [--config <path>] [--log-format text|json] install [--source DIR] [--target DIR]... [--prefix P] [--json]
//! binsync remove [--source DIR] [--target DIR]... [--prefix P] [--json]
//! binsync config init [--force]
//! binsync config show
//! ```

mod commands;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigCommand, install::InstallArgs, remove::RemoveArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "binsync",
    version,
    about = "Atomically install a directory of binaries into one or more target directories",
    long_about = None,
)]
struct Cli {
    /// Config file to read instead of ~/.binsync/config.yaml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log line format on stderr: text | json.
    #[arg(long, global = true, default_value = "text", value_name = "FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy every file of the source directory into each target directory.
    Install(InstallArgs),

    /// Remove previously installed binaries from the target directories.
    Remove(RemoveArgs),

    /// Create or inspect the install config file.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Log format argument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'; expected: text, json")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Install(args) => args.run(config),
        Commands::Remove(args) => args.run(config),
        Commands::Config { command } => commands::config::run(command, config),
    }
}
