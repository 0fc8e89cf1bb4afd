//! Test fixtures and data generators
//!
//! Gateway payloads and REST bodies shaped like the platform sends them.

use serde_json::{json, Value};

/// ID of the session's own user
pub const SELF_ID: u64 = 1;

pub fn user_json(id: u64) -> Value {
    json!({"id": id.to_string(), "username": format!("user{id}"), "discriminator": "0"})
}

pub fn member_json(user_id: u64) -> Value {
    json!({"user": user_json(user_id), "roles": [], "joined_at": "2024-01-01T00:00:00+00:00"})
}

/// READY with the given guilds as unavailable stubs
pub fn ready_json(guilds: &[u64], shard: Option<[u32; 2]>) -> Value {
    let guilds: Vec<Value> = guilds
        .iter()
        .map(|id| json!({"id": id.to_string(), "unavailable": true}))
        .collect();
    let mut data = json!({
        "v": 10,
        "user": {"id": SELF_ID.to_string(), "username": "me", "bot": true},
        "guilds": guilds,
        "session_id": "session",
        "application": {"id": "99"}
    });
    if let Some(shard) = shard {
        data["shard"] = json!(shard);
    }
    data
}

/// A guild shipping `members` out of `member_count`
pub fn guild_json(id: u64, members: &[u64], member_count: usize) -> Value {
    let members: Vec<Value> = members.iter().map(|&m| member_json(m)).collect();
    json!({
        "id": id.to_string(),
        "name": format!("guild {id}"),
        "owner_id": SELF_ID.to_string(),
        "member_count": member_count,
        "large": member_count > 250,
        "roles": [{"id": id.to_string(), "name": "@everyone", "permissions": "0"}],
        "channels": [
            {"id": (id * 10).to_string(), "type": 0, "name": "general"},
            {"id": (id * 10 + 1).to_string(), "type": 2, "name": "voice"}
        ],
        "members": members
    })
}

pub fn chunk_json(guild_id: u64, users: &[u64], index: u32, count: u32, nonce: &str) -> Value {
    let members: Vec<Value> = users.iter().map(|&m| member_json(m)).collect();
    json!({
        "guild_id": guild_id.to_string(),
        "members": members,
        "chunk_index": index,
        "chunk_count": count,
        "nonce": nonce
    })
}

pub fn message_json(id: u64, channel_id: u64, guild_id: Option<u64>, author: u64) -> Value {
    let mut data = json!({
        "id": id.to_string(),
        "channel_id": channel_id.to_string(),
        "author": user_json(author),
        "content": format!("message {id}"),
        "timestamp": "2024-01-01T00:00:00+00:00"
    });
    if let Some(guild_id) = guild_id {
        data["guild_id"] = json!(guild_id.to_string());
    }
    data
}

/// A DM channel with one recipient
pub fn dm_json(channel_id: u64, recipient: u64) -> Value {
    json!({"id": channel_id.to_string(), "type": 1, "recipients": [user_json(recipient)]})
}
