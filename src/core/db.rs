use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

pub fn db_connect(db_path: &str) -> Result<Connection, error::ChantierError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::ChantierError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::ChantierError::RusqliteError)?;
    Ok(conn)
}

/// Execute a closure with a fresh connection to the records database.
pub fn with_conn<F, R>(db_path: &Path, op_name: &str, f: F) -> Result<R, error::ChantierError>
where
    F: FnOnce(&Connection) -> Result<R, error::ChantierError>,
{
    let conn = db_connect(&db_path.to_string_lossy())?;
    let result = f(&conn);
    if let Err(e) = &result {
        tracing::debug!(op = op_name, error = %e, "records db operation failed");
    }
    result
}

pub fn initialize_records_db(db_path: &Path) -> Result<(), error::ChantierError> {
    if let Some(parent_dir) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent_dir).map_err(error::ChantierError::IoError)?;
    }

    with_conn(db_path, "records.init", |conn| {
        conn.execute(schemas::RECORDS_DB_SCHEMA, [])?;
        Ok(())
    })
}
