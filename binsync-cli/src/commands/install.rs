//! `binsync install` — copy the source binaries into every target directory.

use std::path::Path;

use anyhow::{Context, Result};
use binsync_core::InstalledFilenames;
use binsync_sync::copy_binaries;
use clap::Args;
use colored::Colorize;

use super::TargetArgs;

/// Arguments for `binsync install`.
#[derive(Args, Debug)]
pub struct InstallArgs {
    #[command(flatten)]
    pub targets: TargetArgs,

    /// Print the result as JSON instead of a human-readable list.
    #[arg(long)]
    pub json: bool,
}

impl InstallArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let cfg = self.targets.resolve(config_path)?;
        tracing::info!(
            "installing binaries from {} into {} target(s)",
            cfg.source_dir.display(),
            cfg.target_dirs.len()
        );

        if cfg.target_dirs.is_empty() {
            tracing::warn!("no target directories configured; nothing will be written");
        }

        match copy_binaries(&cfg.source_dir, &cfg.target_dirs, &cfg.prefix) {
            Ok(installed) => {
                if self.json {
                    print_json(&installed, None)?;
                } else {
                    print_installed(&installed);
                }
                Ok(())
            }
            Err(failure) => {
                if self.json {
                    print_json(&failure.installed, Some(&failure.error.to_string()))?;
                } else if !failure.installed.is_empty() {
                    eprintln!("installed before the failure:");
                    for name in &failure.installed {
                        eprintln!("  {} {name}", "✓".green());
                    }
                }
                Err(failure).with_context(|| {
                    format!("install from '{}' failed", cfg.source_dir.display())
                })
            }
        }
    }
}

fn print_installed(installed: &InstalledFilenames) {
    if installed.is_empty() {
        println!("Nothing to install.");
        return;
    }
    println!("{} installed {} binaries", "✓".green().bold(), installed.len());
    for name in installed {
        println!("  ✎  {name}");
    }
}

fn print_json(installed: &InstalledFilenames, error: Option<&str>) -> Result<()> {
    let payload = serde_json::json!({
        "installed": installed,
        "error": error,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize install JSON")?
    );
    Ok(())
}
