//! Local session persistence
//!
//! Holds the display name chosen on this device. There is at most one row.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::Username;

/// Session store
pub struct SessionStore<'a> {
    conn: &'a Connection,
}

impl<'a> SessionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Save the chosen name, replacing any previous one
    pub fn save(&self, username: &Username) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session (id, username, updated_at) VALUES (1, ?1, ?2)",
            params![username.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Load the chosen name, if any
    pub fn load(&self) -> Result<Option<Username>> {
        let stored: Option<String> = self
            .conn
            .query_row("SELECT username FROM session WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(stored.and_then(Username::from_stored))
    }

    /// Forget the chosen name; the next start prompts again
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM session", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::Username;
    use crate::storage::Database;

    #[test]
    fn test_session_save_load() {
        let db = Database::open_in_memory().unwrap();
        let name = Username::parse("Bob", 32).unwrap();

        db.session().save(&name).unwrap();
        assert_eq!(db.session().load().unwrap(), Some(name));
    }

    #[test]
    fn test_session_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.session().load().unwrap().is_none());
    }

    #[test]
    fn test_session_replace_and_clear() {
        let db = Database::open_in_memory().unwrap();
        db.session()
            .save(&Username::parse("Ann", 32).unwrap())
            .unwrap();
        db.session()
            .save(&Username::parse("Bob", 32).unwrap())
            .unwrap();
        assert_eq!(db.session().load().unwrap().unwrap().as_str(), "Bob");

        db.session().clear().unwrap();
        assert!(db.session().load().unwrap().is_none());
    }
}
