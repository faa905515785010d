//! Centralized storage layout for the chantier record store.
//!
//! All state lives under three top-level keys of a key-value substrate:
//! 1. `sites`: JSON array of site records.
//! 2. `team`: JSON array of team member records.
//! 3. `planning`: JSON object mapping site id (as string) to a JSON array of tasks.
//!
//! The SQLite substrate keeps every key as one row of a single table.

pub const SITES_KEY: &str = "sites";
pub const TEAM_KEY: &str = "team";
pub const PLANNING_KEY: &str = "planning";

/// Keys seeded by `Store::initialize`, in seeding order.
pub const MANAGED_KEYS: [&str; 3] = [SITES_KEY, TEAM_KEY, PLANNING_KEY];

pub const RECORDS_DB_NAME: &str = "chantier.db";
pub const RECORDS_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const RECORDS_SELECT: &str = "SELECT value FROM records WHERE key = ?1";
pub const RECORDS_UPSERT: &str = "
    INSERT INTO records(key, value, updated_at) VALUES(?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
";
