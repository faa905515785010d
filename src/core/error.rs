use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChantierError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Stored record {key:?} is unreadable: {source}")]
    CorruptRecord {
        key: String,
        source: serde_json::Error,
    },
}
