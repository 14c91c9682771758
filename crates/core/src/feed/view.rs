//! Render-ready panel state

use crate::models::{count_label, ChatMessage};

/// One row in the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageItem {
    pub id: u64,
    pub sender: String,
    pub text: String,
    /// Local `HH:MM`
    pub time: String,
    pub is_own: bool,
}

impl MessageItem {
    /// Own iff the sender equals the session name exactly. Two devices
    /// sharing a name both see the message as their own.
    pub fn from_message(message: &ChatMessage, username: Option<&str>) -> Self {
        Self {
            id: message.id,
            sender: message.sender.clone(),
            text: message.text.clone(),
            time: message.format_time(),
            is_own: username.is_some_and(|name| message.is_from(name)),
        }
    }
}

/// What the panel should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedView {
    /// Panel hidden
    Closed,
    /// First fetch in flight and nothing cached yet
    Loading,
    /// "No messages yet"
    Empty,
    Messages(Vec<MessageItem>),
}

impl FeedView {
    pub fn message_count(&self) -> usize {
        match self {
            FeedView::Messages(items) => items.len(),
            _ => 0,
        }
    }

    /// Header label, e.g. "3 messages"
    pub fn header(&self) -> String {
        count_label(self.message_count())
    }
}
