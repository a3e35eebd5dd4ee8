//! Store module - SQLite connection, schema bootstrap, transactional load

mod loader;

pub use loader::{load_all, LoadSummary, SkipKind, SkippedRow, TripMap};

use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Tables the loader and reporter expect to exist.
pub const TABLES: [&str; 4] = ["loads", "fuel_stops", "expenses", "load_runs"];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database not found: {0} (run `haulbook init-db` first)")]
    NotFound(String),
    #[error("Missing tables: {} (run `haulbook init-db` first)", .0.join(", "))]
    MissingTables(Vec<String>),
}

/// Open an existing database file with foreign keys enforced.
pub fn open(path: &Path) -> Result<Connection, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.display().to_string()));
    }
    let conn = Connection::open(path)?;
    configure(&conn)?;
    log::info!("Database connection successful: {}", path.display());
    Ok(conn)
}

/// Open (creating if needed) a database file for schema bootstrap.
pub fn create(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

/// Apply a schema script. The script is expected to be idempotent
/// (`CREATE TABLE IF NOT EXISTS`).
pub fn apply_schema(conn: &Connection, schema_sql: &str) -> Result<(), StoreError> {
    conn.execute_batch(schema_sql)?;
    verify_schema(conn)
}

/// Fail if any expected table is absent.
pub fn verify_schema(conn: &Connection) -> Result<(), StoreError> {
    let mut missing = Vec::new();
    for table in TABLES {
        let found: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .optional()?;
        if found.is_none() {
            missing.push(table.to_string());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::MissingTables(missing))
    }
}

/// Row count of one of the known tables.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64, StoreError> {
    if !TABLES.contains(&table) {
        return Err(StoreError::MissingTables(vec![table.to_string()]));
    }
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

#[cfg(test)]
pub(crate) mod test_support {
    use rusqlite::Connection;

    pub const SCHEMA: &str = include_str!("../../sql/schema.sql");

    pub fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        super::configure(&conn).unwrap();
        super::apply_schema(&conn, SCHEMA).unwrap();
        conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let conn = test_support::memory_db();
        verify_schema(&conn).unwrap();
        for table in TABLES {
            assert_eq!(count_rows(&conn, table).unwrap(), 0);
        }
    }

    #[test]
    fn missing_tables_are_reported() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE loads (load_id INTEGER PRIMARY KEY);")
            .unwrap();
        let err = verify_schema(&conn).unwrap_err();
        match err {
            StoreError::MissingTables(tables) => {
                assert_eq!(tables, vec!["fuel_stops", "expenses", "load_runs"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn schema_script_is_idempotent() {
        let conn = test_support::memory_db();
        apply_schema(&conn, test_support::SCHEMA).unwrap();
    }

    #[test]
    fn opening_missing_file_fails() {
        let err = open(Path::new("/nonexistent/haulbook.db")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
