//! Current-user endpoints

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chat_core::Snowflake;
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::{HttpClient, RequestBody};
use crate::error::HttpError;
use crate::route::Route;

/// Profile changes for the current user
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Raw image bytes; sent as a data URI. `Some(None)` removes the avatar.
    #[serde(skip)]
    pub avatar: Option<Option<Vec<u8>>>,
}

/// Encode image bytes as a `data:` URI, sniffing the format from the header
pub fn image_data_uri(data: &[u8]) -> Result<String, HttpError> {
    let mime = image_mime(data)
        .ok_or_else(|| HttpError::Validation("unsupported image type given".to_string()))?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(data)))
}

fn image_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if data.len() >= 10 && data[0..3] == [0xff, 0xd8, 0xff]
        && (data[6..10] == *b"JFIF" || data[6..10] == *b"Exif")
    {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && data[8..12] == *b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

impl HttpClient {
    /// Check the token by fetching the current user.
    ///
    /// A 401 becomes [`HttpError::Unauthorized`].
    pub async fn login(&self) -> Result<Value, HttpError> {
        match self.execute(Route::get("/users/@me"), RequestBody::Empty).await {
            Err(HttpError::Http { status: 401, .. }) => Err(HttpError::Unauthorized),
            other => other,
        }
    }

    pub async fn get_user(&self, user_id: Snowflake) -> Result<Value, HttpError> {
        self.execute(
            Route::get("/users/{user_id}").param("user_id", user_id),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn edit_profile(&self, edit: &EditProfile) -> Result<Value, HttpError> {
        let mut payload = serde_json::to_value(edit)?;
        match &edit.avatar {
            Some(Some(data)) => payload["avatar"] = Value::String(image_data_uri(data)?),
            Some(None) => payload["avatar"] = Value::Null,
            None => {}
        }
        self.execute(Route::patch("/users/@me"), RequestBody::Json(payload))
            .await
    }

    /// Open (or fetch) the DM channel with a user
    pub async fn create_dm(&self, recipient_id: Snowflake) -> Result<Value, HttpError> {
        self.execute(
            Route::post("/users/@me/channels"),
            RequestBody::Json(json!({ "recipient_id": recipient_id })),
        )
        .await
    }

    pub async fn leave_guild(&self, guild_id: Snowflake) -> Result<(), HttpError> {
        self.execute(
            Route::delete("/users/@me/guilds/{guild_id}").param("guild_id", guild_id),
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }
}
