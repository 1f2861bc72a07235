//! Serialized copy / remove of a binary set across target directories.
//!
//! ## `copy` protocol
//!
//! 1. Take the synchronizer lock for the whole call.
//! 2. List the source directory (fatal on failure).
//! 3. For every non-directory entry, in name order, and every target in the
//!    order given:
//!    - skip the target if it is not writable;
//!    - sweep `<name>.tmp.*` leftovers (best effort);
//!    - atomically copy (fatal on failure, with the names installed so far).
//! 4. Record `<prefix><entry>` once all targets were handled.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use binsync_core::{InstalledFilenames, SourceFile};

use crate::error::{copy_err, source_err, CopyFailure, SyncError};
use crate::fs::{Filesystem, OsFilesystem};
use crate::stale::{self, CleanupReport};

// ---------------------------------------------------------------------------
// Removal report
// ---------------------------------------------------------------------------

/// Outcome of [`Synchronizer::remove`]. Removal never aborts early.
#[derive(Debug, Default)]
pub struct RemovalReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, std::io::Error)>,
    /// Target directories skipped as not writable.
    pub skipped: Vec<PathBuf>,
}

impl RemovalReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

/// Installs binary sets with at most one operation in flight per instance.
#[derive(Debug, Default)]
pub struct Synchronizer<F = OsFilesystem> {
    fs: F,
    lock: Mutex<()>,
}

impl<F: Filesystem> Synchronizer<F> {
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            lock: Mutex::new(()),
        }
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Install every file directly under `source_dir` into each of
    /// `target_dirs` as `prefix + name`.
    ///
    /// Unwritable targets are skipped. A failed atomic copy aborts the whole
    /// call; the returned [`CopyFailure`] lists the names that were fully
    /// installed before it.
    pub fn copy<P: AsRef<Path>>(
        &self,
        source_dir: &Path,
        target_dirs: &[P],
        prefix: &str,
    ) -> Result<InstalledFilenames, CopyFailure> {
        // Unit guard; a poisoned lock carries no state.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut installed = InstalledFilenames::new();
        let entries = match self.fs.read_dir(source_dir) {
            Ok(entries) => entries,
            Err(e) => {
                return Err(CopyFailure {
                    installed,
                    error: source_err(source_dir, e),
                })
            }
        };

        for entry in entries.iter().filter(|e| !e.is_dir) {
            let target_filename = entry.target_filename(prefix);
            let src = source_dir.join(&entry.name);

            for target_dir in target_dirs {
                let target_dir = target_dir.as_ref();
                if let Err(e) = self.copy_one(&src, entry, target_dir, &target_filename) {
                    return Err(CopyFailure {
                        installed,
                        error: e,
                    });
                }
            }

            installed.insert(target_filename);
        }

        Ok(installed)
    }

    fn copy_one(
        &self,
        src: &Path,
        entry: &SourceFile,
        target_dir: &Path,
        target_filename: &str,
    ) -> Result<(), SyncError> {
        if let Err(e) = self.fs.check_writable(target_dir) {
            tracing::info!("directory {} is not writable, skipping: {e}", target_dir.display());
            return Ok(());
        }

        let report = stale::sweep(&self.fs, target_dir, target_filename);
        log_cleanup(target_dir, target_filename, &report);

        let placed = self
            .fs
            .atomic_copy(src, target_dir, target_filename)
            .map_err(|e| copy_err(target_dir.join(target_filename), e))?;
        tracing::info!("copied {} to {}", entry.name, placed.display());
        Ok(())
    }

    /// Names [`copy`](Self::copy) would install from `source_dir`, without
    /// touching any target.
    pub fn installed_names(
        &self,
        source_dir: &Path,
        prefix: &str,
    ) -> Result<InstalledFilenames, SyncError> {
        let entries = self
            .fs
            .read_dir(source_dir)
            .map_err(|e| source_err(source_dir, e))?;
        Ok(entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.target_filename(prefix))
            .collect())
    }

    /// Delete `filenames` and their temp leftovers from every target.
    ///
    /// Missing files are not failures. Every other failure is logged and
    /// collected; processing always covers all targets.
    pub fn remove<P: AsRef<Path>>(
        &self,
        target_dirs: &[P],
        filenames: &InstalledFilenames,
    ) -> RemovalReport {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut report = RemovalReport::default();
        for target_dir in target_dirs {
            let target_dir = target_dir.as_ref();
            if let Err(e) = self.fs.check_writable(target_dir) {
                tracing::info!("directory {} is not writable, skipping: {e}", target_dir.display());
                report.skipped.push(target_dir.to_path_buf());
                continue;
            }

            for name in filenames {
                let cleanup = stale::sweep(&self.fs, target_dir, name);
                log_cleanup(target_dir, name, &cleanup);
                report.removed.extend(cleanup.removed);
                report.failed.extend(cleanup.failed);

                let path = target_dir.join(name);
                match self.fs.remove_file(&path) {
                    Ok(()) => {
                        tracing::info!("removed {}", path.display());
                        report.removed.push(path);
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        tracing::debug!("{} already absent", path.display());
                    }
                    Err(e) => {
                        tracing::warn!("failed to remove {}: {e}", path.display());
                        report.failed.push((path, e));
                    }
                }
            }
        }
        report
    }
}

fn log_cleanup(target_dir: &Path, target_filename: &str, report: &CleanupReport) {
    if let Some(e) = &report.scan_error {
        tracing::warn!(
            "could not scan {} for temporary {target_filename} files: {e}",
            target_dir.display()
        );
        return;
    }
    if report.removed.is_empty() && report.failed.is_empty() {
        return;
    }
    tracing::info!(
        "target folder {} contains {} temporary file(s) named {target_filename}; deleting them",
        target_dir.display(),
        report.removed.len() + report.failed.len()
    );
    for (path, e) in &report.failed {
        tracing::warn!(
            "failed to delete tmp file {} from previous run: {e}",
            path.display()
        );
    }
}

// ---------------------------------------------------------------------------
// Process-wide entry points
// ---------------------------------------------------------------------------

fn global() -> &'static Synchronizer {
    static GLOBAL: OnceLock<Synchronizer> = OnceLock::new();
    GLOBAL.get_or_init(Synchronizer::default)
}

/// [`Synchronizer::copy`] on the process-wide instance.
///
/// All calls in one process are serialized, whatever their arguments.
pub fn copy_binaries<P: AsRef<Path>>(
    source_dir: &Path,
    target_dirs: &[P],
    prefix: &str,
) -> Result<InstalledFilenames, CopyFailure> {
    global().copy(source_dir, target_dirs, prefix)
}

/// [`Synchronizer::installed_names`] on the process-wide instance.
pub fn installed_names(source_dir: &Path, prefix: &str) -> Result<InstalledFilenames, SyncError> {
    global().installed_names(source_dir, prefix)
}

/// [`Synchronizer::remove`] on the process-wide instance.
pub fn remove_binaries<P: AsRef<Path>>(
    target_dirs: &[P],
    filenames: &InstalledFilenames,
) -> RemovalReport {
    global().remove(target_dirs, filenames)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WritabilityError;
    use std::fs;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Real filesystem with knobs for failure injection and call counting.
    #[derive(Default)]
    struct TestFs {
        fail_copy_for: Option<String>,
        fail_copy_in: Option<PathBuf>,
        fail_removals: bool,
        writability_checks: AtomicUsize,
    }

    impl Filesystem for TestFs {
        fn read_dir(&self, dir: &Path) -> io::Result<Vec<SourceFile>> {
            OsFilesystem.read_dir(dir)
        }

        fn check_writable(&self, dir: &Path) -> Result<(), WritabilityError> {
            self.writability_checks.fetch_add(1, Ordering::SeqCst);
            OsFilesystem.check_writable(dir)
        }

        fn find_stale_temps(&self, dir: &Path, name: &str) -> io::Result<Vec<PathBuf>> {
            OsFilesystem.find_stale_temps(dir, name)
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            if self.fail_removals {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "injected"));
            }
            OsFilesystem.remove_file(path)
        }

        fn atomic_copy(&self, src: &Path, dir: &Path, name: &str) -> io::Result<PathBuf> {
            let fails = self.fail_copy_for.as_deref() == Some(name)
                || self.fail_copy_in.as_deref() == Some(dir);
            if fails {
                return Err(io::Error::other("injected copy failure"));
            }
            OsFilesystem.atomic_copy(src, dir, name)
        }
    }

    fn source_with(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn names(items: &[&str]) -> InstalledFilenames {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_target_list_still_records_every_file() {
        let src = source_with(&[("a", "1"), ("b", "2")]);
        let sync = Synchronizer::new(TestFs::default());
        let got = sync.copy::<PathBuf>(src.path(), &[], "p-").unwrap();
        assert_eq!(got, names(&["p-a", "p-b"]));
    }

    #[test]
    fn fatal_copy_returns_names_installed_before_it() {
        let src = source_with(&[("a", "AAA"), ("b", "BBB"), ("c", "CCC")]);
        let target = TempDir::new().unwrap();
        let sync = Synchronizer::new(TestFs {
            fail_copy_for: Some("b".into()),
            ..TestFs::default()
        });

        let failure = sync.copy(src.path(), &[target.path()], "").unwrap_err();
        assert_eq!(failure.installed, names(&["a"]));
        assert!(matches!(failure.error, SyncError::AtomicCopy { .. }));
        assert_eq!(fs::read_to_string(target.path().join("a")).unwrap(), "AAA");
        assert!(!target.path().join("b").exists());
        assert!(!target.path().join("c").exists(), "processing must stop at the failure");
    }

    #[test]
    fn fatal_copy_on_second_target_skips_remaining_targets() {
        let src = source_with(&[("a", "AAA")]);
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let third = TempDir::new().unwrap();
        let sync = Synchronizer::new(TestFs {
            fail_copy_in: Some(second.path().to_path_buf()),
            ..TestFs::default()
        });

        let failure = sync
            .copy(src.path(), &[first.path(), second.path(), third.path()], "")
            .unwrap_err();
        assert!(failure.installed.is_empty(), "a must not be recorded");
        match &failure.error {
            SyncError::AtomicCopy { path, .. } => assert_eq!(path, &second.path().join("a")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_to_string(first.path().join("a")).unwrap(), "AAA");
        assert!(!second.path().join("a").exists());
        assert!(
            !third.path().join("a").exists(),
            "targets after the failing one must not be touched"
        );
    }

    #[test]
    fn fatal_copy_for_second_file_keeps_earlier_targets_of_it() {
        let src = source_with(&[("a", "AAA"), ("b", "BBB")]);
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let sync = Synchronizer::new(TestFs {
            fail_copy_in: Some(second.path().to_path_buf()),
            ..TestFs::default()
        });

        let failure = sync
            .copy(src.path(), &[first.path(), second.path()], "")
            .unwrap_err();
        assert!(failure.installed.is_empty());
        assert!(first.path().join("a").exists());
        assert!(!first.path().join("b").exists(), "later files must not be processed");
    }

    #[test]
    fn cleanup_failures_do_not_abort() {
        let src = source_with(&[("foo", "new")]);
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("foo.tmp.1234"), "stale").unwrap();
        let sync = Synchronizer::new(TestFs {
            fail_removals: true,
            ..TestFs::default()
        });

        let got = sync.copy(src.path(), &[target.path()], "").unwrap();
        assert_eq!(got, names(&["foo"]));
        assert_eq!(fs::read_to_string(target.path().join("foo")).unwrap(), "new");
        assert!(target.path().join("foo.tmp.1234").exists());
    }

    #[test]
    fn writability_is_rechecked_for_every_file_target_pair() {
        let src = source_with(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let t1 = TempDir::new().unwrap();
        let t2 = TempDir::new().unwrap();
        let sync = Synchronizer::new(TestFs::default());

        sync.copy(src.path(), &[t1.path(), t2.path()], "").unwrap();
        assert_eq!(sync.filesystem().writability_checks.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn source_read_failure_returns_empty_set() {
        let root = TempDir::new().unwrap();
        let sync = Synchronizer::new(TestFs::default());
        let failure = sync
            .copy(&root.path().join("missing"), &[root.path()], "")
            .unwrap_err();
        assert!(failure.installed.is_empty());
        assert!(matches!(failure.error, SyncError::SourceRead { .. }));
    }

    #[test]
    fn lock_survives_a_poisoning_panic() {
        let src = source_with(&[("a", "1")]);
        let sync = std::sync::Arc::new(Synchronizer::new(TestFs::default()));

        let poisoner = sync.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let got = sync.copy::<PathBuf>(src.path(), &[], "").unwrap();
        assert_eq!(got, names(&["a"]));
    }

    #[test]
    fn installed_names_skips_directories() {
        let src = source_with(&[("a", "1")]);
        fs::create_dir(src.path().join("sub")).unwrap();
        let sync = Synchronizer::new(OsFilesystem);
        assert_eq!(sync.installed_names(src.path(), "x-").unwrap(), names(&["x-a"]));
    }

    #[test]
    fn remove_deletes_files_and_leftovers_and_ignores_missing() {
        let target = TempDir::new().unwrap();
        fs::write(target.path().join("p-a"), "1").unwrap();
        fs::write(target.path().join("p-a.tmp.99"), "").unwrap();
        fs::write(target.path().join("unrelated"), "").unwrap();
        let missing_dir = target.path().join("not-there");
        let sync = Synchronizer::new(OsFilesystem);

        let report = sync.remove(
            &[target.path().to_path_buf(), missing_dir.clone()],
            &names(&["p-a", "p-b"]),
        );
        assert!(report.is_clean());
        assert_eq!(report.skipped, vec![missing_dir]);
        assert_eq!(report.removed.len(), 2);
        assert!(!target.path().join("p-a").exists());
        assert!(!target.path().join("p-a.tmp.99").exists());
        assert!(target.path().join("unrelated").exists());
    }

    #[test]
    fn remove_collects_failures_and_keeps_going() {
        let t1 = TempDir::new().unwrap();
        let t2 = TempDir::new().unwrap();
        fs::write(t1.path().join("a"), "").unwrap();
        fs::write(t2.path().join("a"), "").unwrap();
        let sync = Synchronizer::new(TestFs {
            fail_removals: true,
            ..TestFs::default()
        });

        let report = sync.remove(&[t1.path(), t2.path()], &names(&["a"]));
        assert_eq!(report.failed.len(), 2);
        assert!(!report.is_clean());
    }
}
