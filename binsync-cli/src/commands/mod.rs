pub mod config;
pub mod install;
pub mod remove;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use binsync_core::{config as core_config, ConfigError, InstallConfig};
use clap::Args;

/// Flags shared by `install` and `remove`; each overrides the config file.
#[derive(Args, Debug, Default)]
pub struct TargetArgs {
    /// Directory whose top-level files are installed.
    #[arg(long, short = 's', value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Target directory; repeat for several. Replaces the configured list.
    #[arg(long = "target", short = 't', value_name = "DIR")]
    pub targets: Vec<PathBuf>,

    /// Prefix prepended to every installed filename.
    #[arg(long, short = 'p')]
    pub prefix: Option<String>,
}

impl TargetArgs {
    /// Merge flags over the config file.
    ///
    /// An explicit `--config` must exist. The default config file is optional
    /// as long as `--source` is given.
    pub fn resolve(self, config_path: Option<&Path>) -> Result<InstallConfig> {
        let base = match config_path {
            Some(path) => Some(
                core_config::load_from(path)
                    .with_context(|| format!("failed to load config '{}'", path.display()))?,
            ),
            None => match core_config::load() {
                Ok(cfg) => Some(cfg),
                Err(ConfigError::ConfigNotFound { .. }) | Err(ConfigError::HomeNotFound) => None,
                Err(e) => return Err(e).context("failed to load default config"),
            },
        };

        let mut resolved = match (base, self.source) {
            (Some(mut cfg), Some(source)) => {
                cfg.source_dir = source;
                cfg
            }
            (Some(cfg), None) => cfg,
            (None, Some(source)) => InstallConfig {
                source_dir: source,
                target_dirs: vec![],
                prefix: String::new(),
            },
            (None, None) => anyhow::bail!(
                "no source directory: pass --source or run `binsync config init`"
            ),
        };
        if !self.targets.is_empty() {
            resolved.target_dirs = self.targets;
        }
        if let Some(prefix) = self.prefix {
            resolved.prefix = prefix;
        }
        core_config::validate(&resolved).context("invalid install settings")?;
        tracing::debug!(?resolved, "resolved install settings");
        Ok(resolved)
    }
}
