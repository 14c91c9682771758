//! Schema migrations
//!
//! The applied version lives in SQLite's `user_version` pragma. Each step
//! runs in its own transaction together with the version bump.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// Schema steps; step `i` brings the database to version `i + 1`
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "message log",
        r#"
        -- AUTOINCREMENT keeps ids strictly increasing, never reused
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender TEXT NOT NULL,
            text TEXT NOT NULL,
            timestamp INTEGER NOT NULL
        );
        "#,
    ),
    (
        "local session",
        r#"
        CREATE TABLE IF NOT EXISTS session (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            username TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ),
];

/// Version the schema is at
pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Bring the schema up to date
#[instrument(skip(conn))]
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let current = schema_version(conn)? as usize;

    for (index, (name, sql)) in MIGRATIONS.iter().enumerate().skip(current) {
        let version = index + 1;
        info!(version, name, "Applying migration");

        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version as u32)?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_reaches_latest() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        run_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_rerun_is_noop() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO messages (sender, text, timestamp) VALUES ('Ann', 'hi', 1)",
            [],
        )
        .unwrap();

        run_migrations(&mut conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_resumes_from_partial_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATIONS[0].1).unwrap();
        conn.pragma_update(None, "user_version", 1u32).unwrap();

        run_migrations(&mut conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
        conn.execute("DELETE FROM session", []).unwrap();
    }
}
