// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; duration strings, encodings and
/// stdin policies are checked by [`load_and_validate`].
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

/// Load the config the CLI should use.
///
/// - An explicit path must exist.
/// - Without one, [`default_config_path`] is used if present; otherwise an
///   empty config is returned.
pub fn load_for_cli(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let path = default_config_path();
    if path.is_file() {
        debug!(path = %path.display(), "loading default config");
        load_and_validate(&path)
    } else {
        Ok(ConfigFile::default())
    }
}

/// `Outproc.toml` in the current working directory, unless `OUTPROC_CONFIG`
/// names another file.
pub fn default_config_path() -> PathBuf {
    std::env::var_os("OUTPROC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Outproc.toml"))
}
