//! Directory writability probe.
//!
//! Answers "could this process create a file here" without creating one, so
//! read-only mounts are detected without leaving probe files behind.

use std::io;
use std::path::Path;

use crate::error::WritabilityError;

/// `Ok(())` iff `dir` exists, is a directory, and allows creating entries.
pub fn check_dir_writable(dir: &Path) -> Result<(), WritabilityError> {
    let meta = match std::fs::metadata(dir) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(WritabilityError::Missing {
                path: dir.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(WritabilityError::Denied {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    };
    if !meta.is_dir() {
        return Err(WritabilityError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    probe_access(dir, &meta).map_err(|source| WritabilityError::Denied {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn probe_access(dir: &Path, _meta: &std::fs::Metadata) -> io::Result<()> {
    use nix::unistd::{access, AccessFlags};

    // Creating an entry needs search permission as well as write.
    access(dir, AccessFlags::W_OK | AccessFlags::X_OK).map_err(io::Error::from)
}

#[cfg(not(unix))]
fn probe_access(_dir: &Path, meta: &std::fs::Metadata) -> io::Result<()> {
    if meta.permissions().readonly() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "directory is read-only",
        ));
    }
    Ok(())
}
