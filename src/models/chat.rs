use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::normalize::{Fields, Keys, Normalize};

mod keys {
    use super::Keys;

    pub const ID: Keys = &["id", "Id", "conversationId", "ConversationId"];
    pub const TITLE: Keys = &["title", "Title", "name", "Name", "partnerName", "PartnerName"];
    pub const PARTICIPANTS: Keys = &["participantIds", "ParticipantIds", "participants", "Participants"];
    pub const LAST_MESSAGE: Keys = &["lastMessage", "LastMessage"];
    pub const LAST_MESSAGE_AT: Keys = &["lastMessageAt", "LastMessageAt", "updatedAt", "UpdatedAt"];
    pub const UNREAD: Keys = &["unreadCount", "UnreadCount"];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub participant_ids: Vec<String>,
    pub last_message: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

impl Normalize for Conversation {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        // lastMessage is either a preview string or a full message object
        let last_message = match f.first(keys::LAST_MESSAGE) {
            Some(Value::Object(_)) => f
                .nested::<super::Message>(keys::LAST_MESSAGE)
                .map(|m| m.content)
                .unwrap_or_default(),
            _ => f.string(keys::LAST_MESSAGE),
        };
        Self {
            id: f.string(keys::ID),
            title: f.string(keys::TITLE),
            participant_ids: f.string_list(keys::PARTICIPANTS),
            last_message,
            last_message_at: f.datetime(keys::LAST_MESSAGE_AT),
            unread_count: f.i64(keys::UNREAD),
        }
    }
}
