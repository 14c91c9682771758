//! Chat message model

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A message accepted by the store.
///
/// `id` and `timestamp` are assigned by the store at append time and are
/// never rewritten by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub sender: String,
    /// Nanoseconds since the Unix epoch
    pub timestamp: u64,
}

impl ChatMessage {
    /// True if this message was posted under `username` (exact, case-sensitive)
    pub fn is_from(&self, username: &str) -> bool {
        self.sender == username
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        let secs = (self.timestamp / NANOS_PER_SEC) as i64;
        let nanos = (self.timestamp % NANOS_PER_SEC) as u32;
        DateTime::from_timestamp(secs, nanos).unwrap_or_default()
    }

    /// Local wall-clock time, `HH:MM`
    pub fn format_time(&self) -> String {
        self.sent_at()
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}

/// Current time as nanoseconds since the Unix epoch
pub fn now_nanos() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .map(|n| n.max(0) as u64)
        .unwrap_or(0)
}

/// Validate message text before it is posted.
///
/// Returns the trimmed text. Length is counted in characters, not bytes.
pub fn validate_text(text: &str, max_len: usize) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidMessage("Message is empty".into()));
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(Error::InvalidMessage(format!(
            "Message too long: {} characters (max {})",
            len, max_len
        )));
    }
    Ok(trimmed)
}

/// Label shown in the panel header, e.g. "1 message" or "3 messages"
pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 message".to_string()
    } else {
        format!("{} messages", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: &str) -> ChatMessage {
        ChatMessage {
            id: 1,
            text: "hi".to_string(),
            sender: sender.to_string(),
            timestamp: 1_700_000_000_123_456_789,
        }
    }

    #[test]
    fn test_is_from_is_case_sensitive() {
        let m = msg("Ann");
        assert!(m.is_from("Ann"));
        assert!(!m.is_from("ann"));
        assert!(!m.is_from("Ann "));
    }

    #[test]
    fn test_sent_at_keeps_nanos() {
        let m = msg("Ann");
        let at = m.sent_at();
        assert_eq!(at.timestamp(), 1_700_000_000);
        assert_eq!(at.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn test_format_time_shape() {
        let label = msg("Ann").format_time();
        assert_eq!(label.len(), 5);
        assert_eq!(&label[2..3], ":");
    }

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text("  hello \n", 500).unwrap(), "hello");
        assert!(validate_text("   ", 500).is_err());
        assert!(validate_text("", 500).is_err());
        assert!(validate_text("abcdef", 5).is_err());
        // Multi-byte characters count once
        assert!(validate_text("ééééé", 5).is_ok());
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(0), "0 messages");
        assert_eq!(count_label(1), "1 message");
        assert_eq!(count_label(42), "42 messages");
    }

    #[test]
    fn test_now_nanos_is_recent() {
        // Anything after 2020-01-01
        assert!(now_nanos() > 1_577_836_800 * NANOS_PER_SEC);
    }
}
