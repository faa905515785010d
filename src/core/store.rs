//! Record store: JSON values under string keys, on a pluggable substrate.
//!
//! The store is explicit state handed to every repository call. Production code
//! opens a SQLite-backed store; tests use the in-memory substrate.
//!
//! Display reads never fail: a missing key, a substrate error or a value that
//! does not parse all degrade to the type's empty default (`[]` for
//! collections, `{}` for maps). Writes replace the whole value under a key in
//! one statement, so repositories load what they are about to rewrite with
//! [`Store::read_for_update`], which only defaults on an absent key.

use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use crate::core::seed;
use crate::core::time;
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable string-to-string map underneath the record store.
pub trait KvSubstrate: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, error::ChantierError>;
    fn set(&self, key: &str, value: &str) -> Result<(), error::ChantierError>;
}

/// One SQLite file, one row per key.
#[derive(Debug, Clone)]
pub struct SqliteSubstrate {
    db_path: PathBuf,
}

impl SqliteSubstrate {
    pub fn open(db_path: &Path) -> Result<Self, error::ChantierError> {
        db::initialize_records_db(db_path)?;
        Ok(Self {
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl KvSubstrate for SqliteSubstrate {
    fn get(&self, key: &str) -> Result<Option<String>, error::ChantierError> {
        db::with_conn(&self.db_path, "records.get", |conn| {
            let value = conn
                .query_row(schemas::RECORDS_SELECT, params![key], |row| row.get(0))
                .optional()?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), error::ChantierError> {
        db::with_conn(&self.db_path, "records.set", |conn| {
            conn.execute(
                schemas::RECORDS_UPSERT,
                params![key, value, time::now_epoch_z()],
            )?;
            Ok(())
        })
    }
}

/// Process-local substrate. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySubstrate {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySubstrate {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvSubstrate for MemorySubstrate {
    fn get(&self, key: &str) -> Result<Option<String>, error::ChantierError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), error::ChantierError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store handle passed to every repository operation.
pub struct Store {
    substrate: Box<dyn KvSubstrate>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    pub fn with_substrate(substrate: Box<dyn KvSubstrate>) -> Self {
        Self { substrate }
    }

    /// Opens (creating if needed) the SQLite store at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self, error::ChantierError> {
        let substrate = SqliteSubstrate::open(db_path)?;
        tracing::debug!(path = %db_path.display(), "opened sqlite record store");
        Ok(Self::with_substrate(Box::new(substrate)))
    }

    pub fn in_memory() -> Self {
        Self::with_substrate(Box::new(MemorySubstrate::new()))
    }

    pub fn substrate(&self) -> &dyn KvSubstrate {
        self.substrate.as_ref()
    }

    /// Seeds every managed key that is absent. Populated keys, even ones holding
    /// unparseable content, are left untouched, so this is safe on every start.
    pub fn initialize(&self) -> Result<(), error::ChantierError> {
        for key in schemas::MANAGED_KEYS {
            if self.substrate.get(key)?.is_some() {
                continue;
            }
            let Some(value) = seed::seed_value(key) else {
                continue;
            };
            self.substrate.set(key, &serde_json::to_string(&value)?)?;
            tracing::info!(key, "seeded empty record key");
        }
        Ok(())
    }

    /// Reads and deserializes `key`, degrading to `T::default()` when the key is
    /// absent, the substrate fails or the stored text does not parse as `T`.
    pub fn read<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let raw = match self.substrate.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key, "record key absent, using empty default");
                return T::default();
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "record substrate read failed, using empty default");
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "stored record value is malformed, using empty default");
                T::default()
            }
        }
    }

    /// Reads `key` ahead of a read-modify-write. An absent key is the empty
    /// default; a substrate failure or a stored value that does not parse as `T`
    /// is an error, so the caller never writes over data it could not read.
    pub fn read_for_update<T>(&self, key: &str) -> Result<T, error::ChantierError>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.substrate.get(key)? else {
            return Ok(T::default());
        };
        serde_json::from_str(&raw).map_err(|source| {
            tracing::error!(key, error = %source, "refusing to rewrite unreadable record value");
            error::ChantierError::CorruptRecord {
                key: key.to_string(),
                source,
            }
        })
    }

    /// Serializes `value` and replaces whatever was stored under `key`.
    pub fn write<T>(&self, key: &str, value: &T) -> Result<(), error::ChantierError>
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.substrate.set(key, &raw)?;
        tracing::debug!(key, bytes = raw.len(), "wrote record key");
        Ok(())
    }
}
