//! Domain types shared by the synchronizer and its callers.
//!
//! All path fields use `PathBuf`; installed names are plain `String`s because
//! they are built by string concatenation with the configured prefix.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Set of installed filenames (`prefix + source name`) returned by one copy.
///
/// Ordered only so that output is deterministic; insertion order carries no
/// meaning.
pub type InstalledFilenames = BTreeSet<String>;

/// An entry discovered directly under the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name without any directory component.
    pub name: String,
    /// Directories are listed but never copied.
    pub is_dir: bool,
}

impl SourceFile {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }

    /// Name under which this entry is installed into every target directory.
    pub fn target_filename(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.name)
    }
}

/// What to install and where. Persisted as YAML by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Directory whose top-level files are installed.
    pub source_dir: PathBuf,
    /// Directories to install into, processed in order.
    #[serde(default)]
    pub target_dirs: Vec<PathBuf>,
    /// Prepended to every installed filename.
    #[serde(default)]
    pub prefix: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("/opt/cni/bin"),
            target_dirs: vec![PathBuf::from("/host/opt/cni/bin")],
            prefix: String::new(),
        }
    }
}
