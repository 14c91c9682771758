//! SQLite storage layer for Lobby
//!
//! The store process keeps its message log here; the chat client keeps
//! its local session (display name) here. Each opens its own file.

mod memory;
mod messages;
mod migrations;
mod parse;
mod session;
mod traits;

use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;

use crate::error::Result;
use crate::invariants::assert_log_invariants;
use crate::models::ChatMessage;

pub use memory::MemoryLog;
pub use messages::MessageStore;
pub use session::SessionStore;
pub use traits::MessageLog;

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let mut db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&mut self) -> Result<()> {
        migrations::run_migrations(&mut self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<u32> {
        migrations::schema_version(&self.conn)
    }

    /// Get message log store
    pub fn messages(&self) -> MessageStore<'_> {
        MessageStore::new(&self.conn)
    }

    /// Get local session store
    pub fn session(&self) -> SessionStore<'_> {
        SessionStore::new(&self.conn)
    }
}

impl MessageLog for Database {
    fn append(&mut self, sender: &str, text: &str) -> Result<ChatMessage> {
        self.messages().append(sender, text)
    }

    fn snapshot(&self) -> Result<Vec<ChatMessage>> {
        let messages = self.messages().list_all()?;
        assert_log_invariants(&messages);
        Ok(messages)
    }

    fn len(&self) -> Result<u64> {
        self.messages().count()
    }
}
