//! Platform-specific configuration paths.

use crate::constants::APP_NAME;
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "AUDIOPACK_CONFIG";

/// Get the configuration directory for the current platform.
///
/// - Linux: `~/.config/audiopack/`
/// - macOS: `~/Library/Application Support/audiopack/`
/// - Windows: `%APPDATA%\audiopack\`
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(Error::ConfigDirNotFound)
}

/// Get the full path to the config file.
///
/// `AUDIOPACK_CONFIG` wins over the platform directory when set and non-empty.
pub fn config_file_path() -> Result<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV)
        && !explicit.is_empty()
    {
        return Ok(PathBuf::from(explicit));
    }
    Ok(config_dir()?.join("config.toml"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_names_the_app() {
        let path = config_dir().unwrap();
        assert!(path.to_string_lossy().contains("audiopack"));
    }

    #[test]
    fn test_config_file_path_ends_with_toml() {
        if std::env::var_os(CONFIG_ENV).is_some() {
            return;
        }
        let path = config_file_path().unwrap();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
