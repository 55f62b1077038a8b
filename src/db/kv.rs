// Key-value table queries

use rusqlite::{params, Connection, OptionalExtension};
use anyhow::Result;

/// Get a value by key. Returns None if not set.
pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn.query_row(
        "SELECT value FROM kv_store WHERE key = ?1",
        [key],
        |row| row.get(0),
    ).optional()?;
    Ok(value)
}

/// Set a value (upsert). Replaces the whole value.
pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

/// Delete a key. Missing keys are not an error.
pub fn delete_value(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_upsert_replaces_value() {
        let conn = setup();
        assert_eq!(get_value(&conn, "collections").unwrap(), None);

        set_value(&conn, "collections", "[]").unwrap();
        set_value(&conn, "collections", "[1]").unwrap();
        assert_eq!(get_value(&conn, "collections").unwrap().as_deref(), Some("[1]"));

        let rows: i32 = conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_delete_missing_key_ok() {
        let conn = setup();
        delete_value(&conn, "nothing").unwrap();
        set_value(&conn, "k", "v").unwrap();
        delete_value(&conn, "k").unwrap();
        assert_eq!(get_value(&conn, "k").unwrap(), None);
    }
}
