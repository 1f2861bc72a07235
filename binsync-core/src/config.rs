//! YAML install config.
//!
//! # Storage layout
//!
//! ```text
//! ~/.binsync/
//!   config.yaml   (mode 0600, written by `binsync config init`)
//! ```
//!
//! # API pattern
//!
//! Every home-relative function has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! `load_from` / `save_to` take an explicit file path for `--config`.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::error::ConfigError;
use crate::types::InstallConfig;

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.binsync/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".binsync").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load and validate a config from an explicit file path.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_from(path: &Path) -> Result<InstallConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let config: InstallConfig =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
    validate(&config)?;
    Ok(config)
}

/// Load `<home>/.binsync/config.yaml`.
pub fn load_at(home: &Path) -> Result<InstallConfig, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<InstallConfig, ConfigError> {
    load_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a config to `path`.
///
/// Write flow: validate → serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_to(path: &Path, config: &InstallConfig) -> Result<(), ConfigError> {
    validate(config)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file_name = path
        .file_name()
        .ok_or_else(|| ConfigError::Invalid(format!("not a file path: {}", path.display())))?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Save to `<home>/.binsync/config.yaml`.
pub fn save_at(home: &Path, config: &InstallConfig) -> Result<(), ConfigError> {
    save_to(&config_path_at(home), config)
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Write the default config to `path` unless one already exists (or `force`
/// is set).
///
/// Returns the config now on disk and whether it was freshly written.
pub fn init_to(path: &Path, force: bool) -> Result<(InstallConfig, bool), ConfigError> {
    if path.exists() && !force {
        return Ok((load_from(path)?, false));
    }
    let config = InstallConfig::default();
    save_to(path, &config)?;
    Ok((config, true))
}

/// `init_to` on `<home>/.binsync/config.yaml`.
pub fn init_at(home: &Path, force: bool) -> Result<(InstallConfig, bool), ConfigError> {
    init_to(&config_path_at(home), force)
}

/// `init_at` convenience wrapper.
pub fn init(force: bool) -> Result<(InstallConfig, bool), ConfigError> {
    init_at(&home()?, force)
}

// ---------------------------------------------------------------------------
// 5. Validation
// ---------------------------------------------------------------------------

/// Reject configs the synchronizer could not act on sensibly.
///
/// The prefix becomes part of a file name, so it must not contain a path
/// separator.
pub fn validate(config: &InstallConfig) -> Result<(), ConfigError> {
    if config.source_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("source_dir must not be empty".into()));
    }
    if config.prefix.contains('/') || config.prefix.contains(MAIN_SEPARATOR) {
        return Err(ConfigError::Invalid(format!(
            "prefix '{}' must not contain a path separator",
            config.prefix
        )));
    }
    if let Some(empty) = config.target_dirs.iter().position(|d| d.as_os_str().is_empty()) {
        return Err(ConfigError::Invalid(format!(
            "target_dirs[{empty}] must not be empty"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_writes_default_once() {
        let home = TempDir::new().unwrap();
        let (cfg, created) = init_at(home.path(), false).unwrap();
        assert!(created);
        assert_eq!(cfg, InstallConfig::default());

        let (_, created_again) = init_at(home.path(), false).unwrap();
        assert!(!created_again, "existing config must not be overwritten");
    }

    #[test]
    fn init_force_overwrites_existing() {
        let home = TempDir::new().unwrap();
        let custom = InstallConfig {
            source_dir: PathBuf::from("/custom"),
            target_dirs: vec![],
            prefix: "x-".into(),
        };
        save_at(home.path(), &custom).unwrap();

        let (cfg, created) = init_at(home.path(), true).unwrap();
        assert!(created);
        assert_eq!(load_at(home.path()).unwrap(), cfg);
    }

    #[test]
    #[cfg(unix)]
    fn saved_config_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let home = TempDir::new().unwrap();
        save_at(home.path(), &InstallConfig::default()).unwrap();
        let mode = std::fs::metadata(config_path_at(home.path()))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
