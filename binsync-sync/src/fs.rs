//! Filesystem seam used by the synchronizer.

use std::io;
use std::path::{Path, PathBuf};

use binsync_core::SourceFile;

use crate::error::WritabilityError;
use crate::{atomic, stale, writable};

/// The filesystem operations a [`Synchronizer`](crate::Synchronizer) relies on.
///
/// [`OsFilesystem`] is the real thing. Tests wrap it to inject failures.
pub trait Filesystem {
    /// Entries directly under `dir`, sorted by name.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<SourceFile>>;

    /// Whether files can be created in `dir`, without writing anything.
    fn check_writable(&self, dir: &Path) -> Result<(), WritabilityError>;

    /// Leftover `<target_filename>.tmp.*` artifacts in `dir`.
    fn find_stale_temps(&self, dir: &Path, target_filename: &str) -> io::Result<Vec<PathBuf>>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Copy `src` to `<target_dir>/<target_filename>` via temp file + rename.
    /// Returns the final path.
    fn atomic_copy(&self, src: &Path, target_dir: &Path, target_filename: &str)
        -> io::Result<PathBuf>;
}

/// [`Filesystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<SourceFile>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(
                    "skipping non UTF-8 file name {:?} in {}",
                    entry.file_name(),
                    dir.display()
                );
                continue;
            };
            let file_type = entry.file_type()?;
            // Symlinks count as whatever they point at; dangling ones as files.
            let is_dir = if file_type.is_symlink() {
                std::fs::metadata(entry.path())
                    .map(|m| m.is_dir())
                    .unwrap_or(false)
            } else {
                file_type.is_dir()
            };
            entries.push(SourceFile { name, is_dir });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn check_writable(&self, dir: &Path) -> Result<(), WritabilityError> {
        writable::check_dir_writable(dir)
    }

    fn find_stale_temps(&self, dir: &Path, target_filename: &str) -> io::Result<Vec<PathBuf>> {
        stale::find_temp_files(dir, target_filename)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn atomic_copy(
        &self,
        src: &Path,
        target_dir: &Path,
        target_filename: &str,
    ) -> io::Result<PathBuf> {
        atomic::atomic_copy(src, target_dir, target_filename)
    }
}
