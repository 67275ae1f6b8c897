use serde::Serialize;
use serde_json::Value;

use super::{segment, ApiClient};
use crate::errors::ApiError;
use crate::models::{Conversation, Message};
use crate::normalize::{normalize_list, normalize_one};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    content: &'a str,
}

impl ApiClient {
    /// GET /api/chat/conversations
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let raw: Value = self.get("/api/chat/conversations", &[]).await?;
        Ok(normalize_list(&raw))
    }

    /// GET /api/chat/conversations/{id}/messages
    ///
    /// Messages come back in arrival order; callers group them with
    /// [`crate::grouping`].
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        let raw: Value = self
            .get(
                &format!("/api/chat/conversations/{}/messages", segment(conversation_id)),
                &[],
            )
            .await?;
        Ok(normalize_list(&raw))
    }

    /// POST /api/chat/conversations/{id}/messages
    pub async fn send_message(&self, conversation_id: &str, content: &str) -> Result<Message, ApiError> {
        let raw: Value = self
            .post(
                &format!("/api/chat/conversations/{}/messages", segment(conversation_id)),
                &SendMessage { content },
            )
            .await?;
        Ok(normalize_one(&raw))
    }
}
