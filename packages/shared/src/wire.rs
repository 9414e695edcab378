//! Wire types exchanged between server and client.
//!
//! Every server-to-client frame on the Join stream is a JSON-encoded
//! [`ChatMessage`]; the request/response calls (`/api/publish`, `/api/leave`)
//! carry [`ChatMessage`] and [`LeaveRequest`] bodies.

use serde::{Deserialize, Serialize};

/// Maximum chat message length in characters.
///
/// Enforced at the boundaries (client input loop, server publish handler);
/// the core assumes it holds.
pub const MAX_MESSAGE_CHARS: usize = 128;

/// A chat message with its Lamport timestamp.
///
/// An empty `sender_id` is the reserved sentinel for system notices
/// (join/leave announcements) that are attributed to no user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_id: String,
    pub text: String,
    pub lamport: u64,
}

impl ChatMessage {
    /// Whether this message is a system notice (no attributable sender).
    pub fn is_system_notice(&self) -> bool {
        self.sender_id.is_empty()
    }
}

/// Request body for leaving the chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub user_id: String,
    pub lamport: u64,
}

/// A registered user as reported by the inspection API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub name: String,
    pub active: bool,
    /// RFC 3339 wall-clock time of the most recent join. Metadata only,
    /// never used for ordering.
    pub connected_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sender_id_is_system_notice() {
        // given:
        let notice = ChatMessage {
            sender_id: String::new(),
            text: "alice joined Chitty-Chat at Lamport time 3".to_string(),
            lamport: 3,
        };
        let chat = ChatMessage {
            sender_id: "alice".to_string(),
            text: "hi".to_string(),
            lamport: 4,
        };

        // then:
        assert!(notice.is_system_notice());
        assert!(!chat.is_system_notice());
    }

    #[test]
    fn test_chat_message_survives_json() {
        // given:
        let msg = ChatMessage {
            sender_id: "bob".to_string(),
            text: "hello".to_string(),
            lamport: 42,
        };

        // when:
        let json = serde_json::to_string(&msg).unwrap();
        let back: ChatMessage = serde_json::from_str(&json).unwrap();

        // then: the empty-sender sentinel and the timestamp are preserved
        assert_eq!(back, msg);
        assert!(json.contains("\"lamport\":42"));
    }
}
