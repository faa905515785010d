//! Configuration loading and store path resolution.
//!
//! Store path priority:
//! 1. `--store` command-line argument
//! 2. `CHANTIER_STORE` environment variable
//! 3. `[store] path` in the TOML config file
//! 4. `.chantier/chantier.db` under the working directory

use crate::core::error::ChantierError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "chantier.toml";
pub const STORE_ENV_VAR: &str = "CHANTIER_STORE";
pub const LOG_ENV_VAR: &str = "CHANTIER_LOG";
pub const DEFAULT_STORE_DIR: &str = ".chantier";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreSection {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChantierConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Loads the config file. An explicit path must exist; the default
/// `chantier.toml` is optional and its absence yields the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<ChantierConfig, ChantierError> {
    let (config_path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(CONFIG_FILE_NAME), false),
    };

    if !config_path.exists() {
        if required {
            return Err(ChantierError::ConfigError(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }
        return Ok(ChantierConfig::default());
    }

    let content = fs::read_to_string(&config_path).map_err(ChantierError::IoError)?;
    parse_config(&content)
        .map_err(|e| ChantierError::ConfigError(format!("{}: {}", config_path.display(), e)))
}

pub fn parse_config(content: &str) -> Result<ChantierConfig, ChantierError> {
    toml::from_str(content).map_err(|e| ChantierError::ConfigError(e.to_string()))
}

pub fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_DIR).join(schemas::RECORDS_DB_NAME)
}

pub fn resolve_store_path(
    cli_arg: Option<&Path>,
    env_value: Option<&str>,
    config: &ChantierConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }
    if let Some(path) = env_value.filter(|v| !v.trim().is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(path) = &config.store.path {
        return path.clone();
    }
    default_store_path()
}

pub fn resolve_log_filter(env_value: Option<&str>, config: &ChantierConfig) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .or_else(|| config.logging.filter.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}
