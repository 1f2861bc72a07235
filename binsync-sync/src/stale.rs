//! Leftover temp artifacts from interrupted copies.
//!
//! An atomic copy that dies between creating `<name>.tmp.<suffix>` and the
//! rename leaves that file behind. Before each copy the synchronizer sweeps
//! every match of `<name>.tmp.*` out of the target directory. The sweep is
//! best effort: its outcome is a [`CleanupReport`] that callers only log.

use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::fs::Filesystem;

/// Marker between the installed name and the per-attempt suffix.
pub const TEMP_MARKER: &str = ".tmp.";

/// Outcome of one sweep. Never turned into an error.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, io::Error)>,
    /// Set when the directory could not be scanned at all.
    pub scan_error: Option<io::Error>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.scan_error.is_none()
    }
}

/// Glob matching `<target_filename>.tmp.*` against a bare file name.
///
/// The installed name is escaped, so names containing `*`, `?` or `[` only
/// match themselves.
pub fn temp_matcher(target_filename: &str) -> Result<GlobMatcher, globset::Error> {
    let pattern = format!("{}{TEMP_MARKER}*", globset::escape(target_filename));
    Ok(GlobBuilder::new(&pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()?
        .compile_matcher())
}

/// Entries in `dir` matching `<target_filename>.tmp.*`, sorted.
pub fn find_temp_files(dir: &Path, target_filename: &str) -> io::Result<Vec<PathBuf>> {
    let matcher = temp_matcher(target_filename)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut matches: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| matcher.is_match(e.file_name()))
        .map(|e| e.path())
        .collect();
    matches.sort();
    Ok(matches)
}

/// Delete every stale temp artifact for `target_filename` in `dir`.
pub fn sweep<F: Filesystem + ?Sized>(fs: &F, dir: &Path, target_filename: &str) -> CleanupReport {
    let mut report = CleanupReport::default();
    let matches = match fs.find_stale_temps(dir, target_filename) {
        Ok(matches) => matches,
        Err(e) => {
            report.scan_error = Some(e);
            return report;
        }
    };
    for path in matches {
        match fs.remove_file(&path) {
            Ok(()) => report.removed.push(path),
            Err(e) => report.failed.push((path, e)),
        }
    }
    report
}
