//! Where the config file lives.

use crate::constants::{APP_NAME, CONFIG_FILE_NAME, CONFIG_PATH_ENV};
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::ffi::OsString;
use std::path::PathBuf;

/// Per-user config directory, e.g. `$XDG_CONFIG_HOME/pcmflow` on Linux.
pub fn config_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", APP_NAME).ok_or(Error::ConfigDirNotFound)?;
    Ok(dirs.config_dir().to_path_buf())
}

/// Config file in use: `$PCMFLOW_CONFIG` when set and non-empty, otherwise
/// `config.toml` in [`config_dir`].
pub fn config_file_path() -> Result<PathBuf> {
    resolve_config_file(std::env::var_os(CONFIG_PATH_ENV))
}

fn resolve_config_file(explicit: Option<OsString>) -> Result<PathBuf> {
    match explicit.filter(|value| !value.is_empty()) {
        Some(value) => Ok(PathBuf::from(value)),
        None => config_dir().map(|dir| dir.join(CONFIG_FILE_NAME)),
    }
}
