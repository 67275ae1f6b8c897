use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::normalize::{Fields, Keys, Normalize};

mod keys {
    use super::Keys;

    pub const ID: Keys = &["id", "Id", "messageId", "MessageId"];
    pub const SENDER_ID: Keys = &["senderId", "SenderId", "userId", "UserId"];
    pub const SENDER_NAME: Keys = &["senderName", "SenderName", "userName", "UserName", "fullName", "FullName"];
    pub const CONTENT: Keys = &["content", "Content", "text", "Text"];
    pub const TIMESTAMP: Keys = &["createdAt", "CreatedAt", "timestamp", "Timestamp", "sentAt", "SentAt"];
    pub const CREATED_AT_MS: Keys = &["createdAtMs", "CreatedAtMs"];
    pub const REACTIONS: Keys = &["reactions", "Reactions"];

    pub const EMOJI: Keys = &["emoji", "Emoji", "type", "Type"];
    pub const REACTION_USER: Keys = &["userId", "UserId"];
    pub const COUNT: Keys = &["count", "Count"];
}

/// A chat message as received. Never mutated after receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub created_at_ms: Option<i64>,
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// Creation time in epoch milliseconds: `createdAtMs` first, then the
    /// parsed timestamp. `None` when the message carries neither.
    pub fn time_ms(&self) -> Option<i64> {
        self.created_at_ms
            .or_else(|| self.timestamp.map(|t| t.timestamp_millis()))
    }
}

impl Normalize for Message {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        Self {
            id: f.string(keys::ID),
            sender_id: f.string(keys::SENDER_ID),
            sender_name: f.string(keys::SENDER_NAME),
            content: f.string(keys::CONTENT),
            timestamp: f.datetime(keys::TIMESTAMP),
            created_at_ms: f.opt_i64(keys::CREATED_AT_MS),
            reactions: f.list(keys::REACTIONS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    pub user_id: String,
    pub count: i64,
}

impl Normalize for Reaction {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        Self {
            emoji: f.string(keys::EMOJI),
            user_id: f.string(keys::REACTION_USER),
            // a per-user reaction row counts once
            count: f.opt_i64(keys::COUNT).unwrap_or(1),
        }
    }
}
