use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Read `config.toml` from the data directory. `Ok(None)` if it doesn't exist.
pub fn try_read_config(data_dir: &Path) -> Result<Option<Config>, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(Some(toml::from_str(&text)?))
}

/// Like [`try_read_config`], but a bad file logs a warning and yields defaults.
pub fn read_config(data_dir: &Path) -> Config {
    match try_read_config(data_dir) {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable config, using defaults");
            Config::default()
        }
    }
}
