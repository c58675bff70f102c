// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile, BUILTIN_CONFIG};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// The built-in configuration, validated.
pub fn load_builtin() -> Result<ConfigFile> {
    let raw: RawConfigFile = toml::from_str(BUILTIN_CONFIG)?;
    ConfigFile::try_from(raw)
}

/// Load `path`, falling back to the built-in configuration when `path` is
/// the default location and no file exists there. An explicitly requested
/// file must exist.
pub fn load_or_builtin(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path == default_config_path() && !path.exists() {
        info!(path = ?path, "no config file found; using built-in configuration");
        return load_builtin();
    }
    load_and_validate(path)
}

/// `Sitepipe.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Sitepipe.toml")
}
