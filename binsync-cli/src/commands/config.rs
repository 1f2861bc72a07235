//! `binsync config` — create and inspect the install config file.

use std::path::Path;

use anyhow::{Context, Result};
use binsync_core::config;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default config file (kept if one already exists).
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
    /// Print the config file as YAML.
    Show,
}

pub fn run(command: ConfigCommand, config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => config::config_path().context("could not determine home directory")?,
    };

    match command {
        ConfigCommand::Init { force } => {
            let (_, created) = config::init_to(&path, force)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            if created {
                println!("✓ Wrote default config to {}", path.display());
            } else {
                println!("✓ Config already present at {}", path.display());
            }
        }
        ConfigCommand::Show => {
            let cfg = config::load_from(&path)
                .with_context(|| format!("failed to load config '{}'", path.display()))?;
            let yaml = serde_yaml::to_string(&cfg).context("failed to serialize config")?;
            print!("{yaml}");
        }
    }
    Ok(())
}
