//! Message, reaction and pin endpoints

use chat_core::{PartialEmoji, Snowflake};
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::{HttpClient, RequestBody};
use crate::error::HttpError;
use crate::file::File;
use crate::route::Route;

/// Most messages one bulk delete may remove
pub const BULK_DELETE_MAX: usize = 100;

/// Reply target
#[derive(Debug, Clone, Serialize)]
pub struct MessageReference {
    pub message_id: Snowflake,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    pub fail_if_not_exists: bool,
}

/// New message
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tts: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sticker_ids: Vec<Snowflake>,
    #[serde(skip)]
    pub files: Vec<File>,
}

impl CreateMessage {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn file(mut self, file: File) -> Self {
        self.files.push(file);
        self
    }

    #[must_use]
    pub fn reply_to(mut self, message_id: Snowflake) -> Self {
        self.message_reference = Some(MessageReference {
            message_id,
            channel_id: None,
            guild_id: None,
            fail_if_not_exists: true,
        });
        self
    }
}

/// Message edit; unset fields are left alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

/// History pagination; at most one cursor is honoured by the API
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryQuery {
    pub limit: Option<u8>,
    pub before: Option<Snowflake>,
    pub after: Option<Snowflake>,
    pub around: Option<Snowflake>,
}

impl HttpClient {
    pub async fn send_message(
        &self,
        channel_id: Snowflake,
        message: CreateMessage,
    ) -> Result<Value, HttpError> {
        let files = message.files.clone();
        let body = RequestBody::with_files(&message, files)?;
        self.execute(
            Route::post("/channels/{channel_id}/messages").param("channel_id", channel_id),
            body,
        )
        .await
    }

    pub async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        edit: &EditMessage,
    ) -> Result<Value, HttpError> {
        self.execute(
            Route::patch("/channels/{channel_id}/messages/{message_id}")
                .param("channel_id", channel_id)
                .param("message_id", message_id),
            RequestBody::json(edit)?,
        )
        .await
    }

    pub async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<(), HttpError> {
        self.execute(
            Route::delete("/channels/{channel_id}/messages/{message_id}")
                .param("channel_id", channel_id)
                .param("message_id", message_id),
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }

    pub async fn get_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<Value, HttpError> {
        self.execute(
            Route::get("/channels/{channel_id}/messages/{message_id}")
                .param("channel_id", channel_id)
                .param("message_id", message_id),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn message_history(
        &self,
        channel_id: Snowflake,
        query: HistoryQuery,
    ) -> Result<Value, HttpError> {
        let route = Route::get("/channels/{channel_id}/messages")
            .param("channel_id", channel_id)
            .query_opt("limit", query.limit.map(|l| l.clamp(1, 100)))
            .query_opt("before", query.before)
            .query_opt("after", query.after)
            .query_opt("around", query.around);
        self.execute(route, RequestBody::Empty).await
    }

    /// Delete 2 to 100 messages at once
    pub async fn bulk_delete_messages(
        &self,
        channel_id: Snowflake,
        message_ids: &[Snowflake],
    ) -> Result<(), HttpError> {
        if !(2..=BULK_DELETE_MAX).contains(&message_ids.len()) {
            return Err(HttpError::Validation(format!(
                "bulk delete takes 2 to {BULK_DELETE_MAX} messages, got {}",
                message_ids.len()
            )));
        }
        self.execute(
            Route::post("/channels/{channel_id}/messages/bulk-delete")
                .param("channel_id", channel_id),
            RequestBody::Json(json!({ "messages": message_ids })),
        )
        .await?;
        Ok(())
    }

    pub async fn pins(&self, channel_id: Snowflake) -> Result<Value, HttpError> {
        self.execute(
            Route::get("/channels/{channel_id}/pins").param("channel_id", channel_id),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn pin_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<(), HttpError> {
        self.execute(
            Route::put("/channels/{channel_id}/pins/{message_id}")
                .param("channel_id", channel_id)
                .param("message_id", message_id),
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }

    pub async fn unpin_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<(), HttpError> {
        self.execute(
            Route::delete("/channels/{channel_id}/pins/{message_id}")
                .param("channel_id", channel_id)
                .param("message_id", message_id),
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }

    pub async fn add_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &PartialEmoji,
    ) -> Result<(), HttpError> {
        self.execute(
            Route::put("/channels/{channel_id}/messages/{message_id}/reactions/{emoji}/@me")
                .param("channel_id", channel_id)
                .param("message_id", message_id)
                .param("emoji", emoji.to_route_key()),
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }

    pub async fn remove_own_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &PartialEmoji,
    ) -> Result<(), HttpError> {
        self.execute(
            Route::delete("/channels/{channel_id}/messages/{message_id}/reactions/{emoji}/@me")
                .param("channel_id", channel_id)
                .param("message_id", message_id)
                .param("emoji", emoji.to_route_key()),
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }

    /// Show the typing indicator for a few seconds
    pub async fn trigger_typing(&self, channel_id: Snowflake) -> Result<(), HttpError> {
        self.execute(
            Route::post("/channels/{channel_id}/typing").param("channel_id", channel_id),
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_message_serialization() {
        let message = CreateMessage::content("hi")
            .reply_to(Snowflake::new(5))
            .file(File::new("a.txt", b"x".to_vec()));
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(
            value,
            json!({
                "content": "hi",
                "message_reference": {"message_id": "5", "fail_if_not_exists": true}
            })
        );
    }
}
