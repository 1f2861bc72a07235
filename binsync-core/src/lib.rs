//! binsync core library — domain types, install config persistence, errors.
//!
//! Public API surface:
//! - [`types`] — source entries, installed filename set, install config
//! - [`error`] — [`ConfigError`]
//! - [`config`] — load / save / validate

pub mod config;
pub mod error;
pub mod types;

pub use error::ConfigError;
pub use types::{InstallConfig, InstalledFilenames, SourceFile};
