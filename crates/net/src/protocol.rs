//! Network protocol message types
//!
//! One request, one response. All messages are JSON-serialized and
//! length-prefixed on the wire.

use lobby_core::ChatMessage;
use serde::{Deserialize, Serialize};

/// Client to store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Full log snapshot
    GetMessages,

    /// Append one message
    PostMessage { sender: String, text: String },
}

/// Store to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Full log, ascending by id
    Messages { messages: Vec<ChatMessage> },

    /// The appended message as stored
    Posted { message: ChatMessage },

    /// Request refused or failed
    Error { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(Request::GetMessages).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "GetMessages" }));

        let json = serde_json::to_value(Request::PostMessage {
            sender: "Bob".into(),
            text: "yo".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "PostMessage", "sender": "Bob", "text": "yo" })
        );
    }

    #[test]
    fn test_large_ids_survive_json() {
        let response = Response::Posted {
            message: ChatMessage {
                id: u64::MAX,
                text: "hi".into(),
                sender: "Ann".into(),
                timestamp: 1_760_000_000_000_000_000,
            },
        };

        let bytes = serde_json::to_vec(&response).unwrap();
        let decoded: Response = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, response);
    }
}
