// Wallmix - Key-value persistence
// Flat string-keyed storage. A write replaces the whole value under a key;
// there is no partial update and no multi-key transaction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;

use crate::db;
use crate::error::{Result, WallmixError};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store. Stores only the DB path and opens a short-lived
/// connection per call.
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create the database (and its directory) if needed and run migrations.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        db::open_db(&db_path)?;
        log::debug!("Key-value store at {}", db_path.display());
        Ok(Self { db_path })
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        Ok(conn)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connect()?;
        Ok(db::kv::get_value(&conn, key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connect()?;
        db::kv::set_value(&conn, key, value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let conn = self.connect()?;
        db::kv::delete_value(&conn, key)?;
        Ok(())
    }
}

/// In-process store, used for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of set/delete calls so far
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|e| WallmixError::Other(format!("memory store poisoned: {}", e)))
    }

    fn bump_writes(&self) {
        if let Ok(mut writes) = self.writes.lock() {
            *writes += 1;
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        self.bump_writes();
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        self.bump_writes();
        Ok(())
    }
}
