//! `binsync remove` — take installed binaries back out of the target directories.

use std::path::Path;

use anyhow::{Context, Result};
use binsync_sync::{installed_names, remove_binaries};
use clap::Args;
use colored::Colorize;

use super::TargetArgs;

/// Arguments for `binsync remove`.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub targets: TargetArgs,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

impl RemoveArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let cfg = self.targets.resolve(config_path)?;
        let names = installed_names(&cfg.source_dir, &cfg.prefix).with_context(|| {
            format!("cannot list binaries in '{}'", cfg.source_dir.display())
        })?;

        let report = remove_binaries(&cfg.target_dirs, &names);

        if self.json {
            let failed: Vec<_> = report
                .failed
                .iter()
                .map(|(path, e)| serde_json::json!({ "path": path, "error": e.to_string() }))
                .collect();
            let payload = serde_json::json!({
                "removed": report.removed,
                "skipped": report.skipped,
                "failed": failed,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize remove JSON")?
            );
        } else {
            for path in &report.removed {
                println!("  {} {}", "✗".red(), path.display());
            }
            for dir in &report.skipped {
                println!("  ·  {} (not writable, skipped)", dir.display());
            }
            for (path, e) in &report.failed {
                eprintln!("  {} {}: {e}", "!".yellow().bold(), path.display());
            }
            println!("{} removed {} file(s)", "✓".green().bold(), report.removed.len());
        }

        if !report.is_clean() {
            anyhow::bail!("{} file(s) could not be removed", report.failed.len());
        }
        Ok(())
    }
}
