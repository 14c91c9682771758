//! Message log storage operations

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::{now_nanos, ChatMessage};

use super::parse::{parse_u64, to_i64};

pub struct MessageStore<'a> {
    conn: &'a Connection,
}

impl<'a> MessageStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append a message, assigning its id and timestamp
    pub fn append(&self, sender: &str, text: &str) -> Result<ChatMessage> {
        let timestamp = now_nanos();
        self.conn.execute(
            "INSERT INTO messages (sender, text, timestamp) VALUES (?1, ?2, ?3)",
            params![sender, text, to_i64(timestamp)?],
        )?;
        let id = parse_u64(self.conn.last_insert_rowid(), 0)?;

        Ok(ChatMessage {
            id,
            text: text.to_string(),
            sender: sender.to_string(),
            timestamp,
        })
    }

    /// Full log in assignment order
    pub fn list_all(&self) -> Result<Vec<ChatMessage>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, sender, text, timestamp FROM messages ORDER BY id ASC")?;

        let messages = stmt
            .query_map([], Self::map_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(parse_u64(count, 0)?)
    }

    fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
        Ok(ChatMessage {
            id: parse_u64(row.get(0)?, 0)?,
            sender: row.get(1)?,
            text: row.get(2)?,
            timestamp: parse_u64(row.get(3)?, 3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    #[test]
    fn test_append_assigns_increasing_ids() {
        let db = Database::open_in_memory().unwrap();
        let store = db.messages();

        let a = store.append("Ann", "hi").unwrap();
        let b = store.append("Bob", "yo").unwrap();

        assert_eq!(a.id, 1);
        assert!(b.id > a.id);
        assert!(b.timestamp >= a.timestamp);
    }

    #[test]
    fn test_list_all_in_order() {
        let db = Database::open_in_memory().unwrap();
        let store = db.messages();
        assert!(store.list_all().unwrap().is_empty());

        store.append("Ann", "one").unwrap();
        store.append("Ann", "two").unwrap();
        store.append("Bob", "three").unwrap();

        let texts: Vec<_> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.db");

        {
            let db = Database::open(&path).unwrap();
            db.messages().append("Ann", "persisted").unwrap();
        }

        let db = Database::open(&path).unwrap();
        let all = db.messages().list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].text, "persisted");

        // Ids keep growing after reopen
        let next = db.messages().append("Bob", "later").unwrap();
        assert_eq!(next.id, 2);
    }
}
