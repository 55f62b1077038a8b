// Database module
// A single SQLite file under the data dir holding the key-value table.

pub mod kv;
pub mod migrations;

use rusqlite::Connection;
use std::path::Path;
use anyhow::Result;

/// Open or create a database at the given path
pub fn open_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!(
                    "Cannot create data directory {}: {}. Check directory permissions.",
                    parent.display(),
                    e
                )
            })?;
        }
    }

    let conn = Connection::open(db_path)?;

    // WAL keeps readers from blocking the single writer
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA busy_timeout = 5000;")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}
