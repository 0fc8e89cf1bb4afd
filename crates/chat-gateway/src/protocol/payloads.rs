//! Command payloads sent by the client

use chat_core::Snowflake;
use serde::{Deserialize, Serialize};

/// Payload for op 8 (Request Guild Members)
///
/// An empty `query` with `limit` 0 asks for every member of the guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestGuildMembersPayload {
    pub guild_id: Snowflake,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    pub limit: u32,

    #[serde(default)]
    pub presences: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<Snowflake>>,

    /// Echoed back on every `GUILD_MEMBERS_CHUNK` of this request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl RequestGuildMembersPayload {
    /// Request every member of a guild
    #[must_use]
    pub fn all(guild_id: Snowflake, nonce: impl Into<String>) -> Self {
        Self {
            guild_id,
            query: Some(String::new()),
            limit: 0,
            presences: false,
            user_ids: None,
            nonce: Some(nonce.into()),
        }
    }

    #[must_use]
    pub fn with_presences(mut self, presences: bool) -> Self {
        self.presences = presences;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_all_members_serialization() {
        let payload = RequestGuildMembersPayload::all(Snowflake::new(42), "abc").with_presences(true);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["guild_id"], "42");
        assert_eq!(json["query"], "");
        assert_eq!(json["limit"], 0);
        assert_eq!(json["presences"], true);
        assert_eq!(json["nonce"], "abc");
        assert!(json.get("user_ids").is_none());
    }
}
