//! Guild, member and role endpoints

use chat_core::Snowflake;
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::{HttpClient, RequestBody};
use crate::error::HttpError;
use crate::route::Route;

/// Member edit; unset fields are left alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditMember {
    /// `Some(None)` clears the nickname
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Snowflake>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deaf: Option<bool>,
    /// Move to a voice channel, `Some(None)` disconnects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Option<Snowflake>>,
}

impl HttpClient {
    pub async fn get_guild(&self, guild_id: Snowflake, with_counts: bool) -> Result<Value, HttpError> {
        self.execute(
            Route::get("/guilds/{guild_id}")
                .param("guild_id", guild_id)
                .query("with_counts", with_counts),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn guild_channels(&self, guild_id: Snowflake) -> Result<Value, HttpError> {
        self.execute(
            Route::get("/guilds/{guild_id}/channels").param("guild_id", guild_id),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn get_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Result<Value, HttpError> {
        self.execute(
            Route::get("/guilds/{guild_id}/members/{user_id}")
                .param("guild_id", guild_id)
                .param("user_id", user_id),
            RequestBody::Empty,
        )
        .await
    }

    /// One page of members, ordered by user ID
    pub async fn list_members(
        &self,
        guild_id: Snowflake,
        limit: u16,
        after: Option<Snowflake>,
    ) -> Result<Value, HttpError> {
        self.execute(
            Route::get("/guilds/{guild_id}/members")
                .param("guild_id", guild_id)
                .query("limit", limit.clamp(1, 1000))
                .query_opt("after", after),
            RequestBody::Empty,
        )
        .await
    }

    pub async fn edit_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        edit: &EditMember,
    ) -> Result<Value, HttpError> {
        self.execute(
            Route::patch("/guilds/{guild_id}/members/{user_id}")
                .param("guild_id", guild_id)
                .param("user_id", user_id),
            RequestBody::json(edit)?,
        )
        .await
    }

    pub async fn kick_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Result<(), HttpError> {
        self.execute(
            Route::delete("/guilds/{guild_id}/members/{user_id}")
                .param("guild_id", guild_id)
                .param("user_id", user_id),
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }

    /// Ban a user, deleting up to seven days of their messages
    pub async fn ban_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        delete_message_seconds: u32,
    ) -> Result<(), HttpError> {
        self.execute(
            Route::put("/guilds/{guild_id}/bans/{user_id}")
                .param("guild_id", guild_id)
                .param("user_id", user_id),
            RequestBody::Json(json!({
                "delete_message_seconds": delete_message_seconds.min(604_800)
            })),
        )
        .await?;
        Ok(())
    }

    pub async fn add_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> Result<(), HttpError> {
        self.execute(
            Route::put("/guilds/{guild_id}/members/{user_id}/roles/{role_id}")
                .param("guild_id", guild_id)
                .param("user_id", user_id)
                .param("role_id", role_id),
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }

    pub async fn remove_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> Result<(), HttpError> {
        self.execute(
            Route::delete("/guilds/{guild_id}/members/{user_id}/roles/{role_id}")
                .param("guild_id", guild_id)
                .param("user_id", user_id)
                .param("role_id", role_id),
            RequestBody::Empty,
        )
        .await?;
        Ok(())
    }
}
