//! Atomic file placement.
//!
//! 1. Open the source and read its permission bits.
//! 2. Create `<target>.tmp.<random>` in the target directory (same
//!    filesystem, so the rename cannot cross a mount).
//! 3. Copy the content, apply the source permissions, fsync.
//! 4. Rename over `<target>`.
//!
//! Readers of `<target>` see the old file or the new one, never a prefix of
//! either. On any failure the temp file is removed when it is dropped.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::stale::TEMP_MARKER;

/// Copy `src` to `<target_dir>/<target_filename>` atomically.
pub fn atomic_copy(src: &Path, target_dir: &Path, target_filename: &str) -> io::Result<PathBuf> {
    let target = target_dir.join(target_filename);

    let mut input = File::open(src)?;
    let meta = input.metadata()?;
    if meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is a directory", src.display()),
        ));
    }

    let prefix = format!("{target_filename}{TEMP_MARKER}");
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .tempfile_in(target_dir)?;

    io::copy(&mut input, tmp.as_file_mut())?;
    tmp.as_file().set_permissions(meta.permissions())?;
    tmp.as_file().sync_all()?;

    tmp.persist(&target).map_err(|e| e.error)?;
    tracing::debug!("renamed temp file into {}", target.display());
    Ok(target)
}
