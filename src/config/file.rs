//! Reading and writing the TOML config file.

use crate::config::{Config, config_file_path, validate_config};
use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read and validate the config at `path`. A missing file yields defaults.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config: Config = toml::from_str(&text).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_config(&config)?;

    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load the user's config, falling back to defaults on platforms without a
/// config directory.
pub fn load_default_config() -> Result<Config> {
    match config_file_path() {
        Ok(path) => load_config_file(&path),
        Err(Error::ConfigDirNotFound) => Ok(Config::default()),
        Err(e) => Err(e),
    }
}

/// Validate `config` and write it to `path`, creating parent directories.
///
/// The file is written next to its destination and renamed into place, so a
/// failed write never leaves a half-written config behind.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    validate_config(config)?;
    let text = toml::to_string_pretty(config).map_err(|source| Error::ConfigSerialize { source })?;

    let write_error = |source| Error::ConfigWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let staging = path.with_extension("toml.tmp");
    std::fs::write(&staging, text).map_err(write_error)?;
    std::fs::rename(&staging, path).map_err(write_error)
}

/// Write `config` to [`config_file_path`] and return that path.
pub fn save_default_config(config: &Config) -> Result<PathBuf> {
    let path = config_file_path()?;
    save_config(config, &path)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{ChannelMode, EncodeQuality};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_nonexistent_file_returns_default() {
        let path = Path::new("/nonexistent/path/config.toml");
        let config = load_config_file(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[decode]
target_sample_rate = 16000
channels = "mono"

[encode]
bit_rate = 192000
quality = "high"
"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.decode.target_sample_rate, Some(16_000));
        assert_eq!(config.decode.channels, ChannelMode::Mono);
        assert!(config.decode.gapless);
        assert_eq!(config.encode.bit_rate, 192_000);
        assert_eq!(config.encode.quality, EncodeQuality::High);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let config = load_config_file(file.path());
        assert!(matches!(config, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[encode]\nbit_rate = 0").unwrap();

        let config = load_config_file(file.path());
        assert!(matches!(config, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.decode.target_sample_rate = Some(22_050);
        save_config(&config, &path).unwrap();

        assert_eq!(load_config_file(&path).unwrap(), config);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.encode.bit_rate = 0;
        assert!(matches!(
            save_config(&config, &path),
            Err(Error::ConfigValidation { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_unreadable_path_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be read as a file.
        let result = load_config_file(dir.path());
        assert!(matches!(result, Err(Error::ConfigRead { .. })));
    }
}
