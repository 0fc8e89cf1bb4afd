//! Channel endpoints

use chat_core::Snowflake;
use serde::Serialize;
use serde_json::Value;

use crate::client::{HttpClient, RequestBody};
use crate::error::HttpError;
use crate::route::Route;

/// Channel edit; unset fields are left alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditChannel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_user: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Snowflake>,
}

impl HttpClient {
    pub async fn get_channel(&self, channel_id: Snowflake) -> Result<Value, HttpError> {
        self.execute(
            Route::get("/channels/{channel_id}").param("channel_id", channel_id),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn edit_channel(
        &self,
        channel_id: Snowflake,
        edit: &EditChannel,
    ) -> Result<Value, HttpError> {
        self.execute(
            Route::patch("/channels/{channel_id}").param("channel_id", channel_id),
            RequestBody::json(edit)?,
        )
        .await
    }

    pub async fn delete_channel(&self, channel_id: Snowflake) -> Result<Value, HttpError> {
        self.execute(
            Route::delete("/channels/{channel_id}").param("channel_id", channel_id),
            RequestBody::Empty,
        )
        .await
    }
}
