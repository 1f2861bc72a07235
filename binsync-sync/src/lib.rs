//! # binsync-sync
//!
//! Serialized, atomic installation of a directory of binaries into one or
//! more target directories.
//!
//! Call [`copy_binaries`] to install every file of a source directory under
//! a prefixed name, or [`remove_binaries`] to take installed names back out.
//! Both go through one process-wide [`Synchronizer`]; build your own
//! [`Synchronizer`] over a custom [`Filesystem`] to stage or test the
//! behaviour in isolation.

pub mod atomic;
pub mod error;
pub mod fs;
pub mod stale;
pub mod synchronizer;
pub mod writable;

pub use error::{CopyFailure, SyncError, WritabilityError};
pub use fs::{Filesystem, OsFilesystem};
pub use stale::CleanupReport;
pub use synchronizer::{copy_binaries, installed_names, remove_binaries, RemovalReport, Synchronizer};
