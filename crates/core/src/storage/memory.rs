//! In-memory message log
//!
//! Lost on restart. Used by `lobby serve --memory` and in tests.

use crate::error::Result;
use crate::invariants::assert_append_invariants;
use crate::models::{now_nanos, ChatMessage};

use super::traits::MessageLog;

#[derive(Debug)]
pub struct MemoryLog {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
        }
    }
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageLog for MemoryLog {
    fn append(&mut self, sender: &str, text: &str) -> Result<ChatMessage> {
        let message = ChatMessage {
            id: self.next_id,
            text: text.to_string(),
            sender: sender.to_string(),
            timestamp: now_nanos(),
        };
        assert_append_invariants(self.messages.last(), &message);
        self.next_id += 1;
        self.messages.push(message.clone());
        Ok(message)
    }

    fn snapshot(&self) -> Result<Vec<ChatMessage>> {
        Ok(self.messages.clone())
    }

    fn len(&self) -> Result<u64> {
        Ok(self.messages.len() as u64)
    }
}
