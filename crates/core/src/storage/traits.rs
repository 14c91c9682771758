//! Storage traits
//!
//! `MessageLog` is the store side of the chat contract. The reference
//! server runs on any implementation (SQLite, in-memory).

use crate::error::Result;
use crate::models::ChatMessage;

/// Append-only, ordered message log
pub trait MessageLog {
    /// Append one message; the log assigns `id` and `timestamp`
    fn append(&mut self, sender: &str, text: &str) -> Result<ChatMessage>;

    /// Full log, ascending by id
    fn snapshot(&self) -> Result<Vec<ChatMessage>>;

    /// Number of messages in the log
    fn len(&self) -> Result<u64>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
