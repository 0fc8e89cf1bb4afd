//! Decoded dispatch events
//!
//! One variant per known event name. Unknown names decode to
//! [`GatewayEvent::Unknown`] so newer gateway versions do not break the
//! client.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::event_types::GatewayEventType;
use super::payloads::{
    ChannelPayload, ChannelPinsUpdatePayload, GuildDeletePayload, GuildEmojisUpdatePayload,
    GuildMemberPayload, GuildMemberRemovePayload, GuildMembersChunkPayload, GuildPayload,
    GuildRoleDeletePayload, GuildRolePayload, GuildStickersUpdatePayload, MessageDeleteBulkPayload,
    MessageDeletePayload, MessagePayload, MessageUpdatePayload, PresencePayload,
    ReactionClearEmojiPayload, ReactionClearPayload, ReactionEventPayload, ReadyPayload,
    ScheduledEventPayload, ScheduledEventUserPayload, ThreadDeletePayload, ThreadListSyncPayload,
    TypingStartPayload, UnavailableGuildPayload, UserPayload, VoiceServerUpdatePayload,
    VoiceStatePayload,
};

/// Payload of a known event failed to decode
#[derive(Debug, thiserror::Error)]
#[error("failed to decode {event} payload: {source}")]
pub struct DecodeError {
    pub event: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// A dispatch event with its typed payload
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Ready(Box<ReadyPayload>),
    Resumed,

    /// Full guild data
    GuildCreate(Box<GuildPayload>),
    /// GUILD_CREATE for a guild that is still in an outage
    GuildUnavailable(UnavailableGuildPayload),
    GuildUpdate(Box<GuildPayload>),
    GuildDelete(GuildDeletePayload),
    GuildEmojisUpdate(GuildEmojisUpdatePayload),
    GuildStickersUpdate(GuildStickersUpdatePayload),
    GuildRoleCreate(GuildRolePayload),
    GuildRoleUpdate(GuildRolePayload),
    GuildRoleDelete(GuildRoleDeletePayload),

    GuildMemberAdd(Box<GuildMemberPayload>),
    GuildMemberUpdate(Box<GuildMemberPayload>),
    GuildMemberRemove(GuildMemberRemovePayload),
    GuildMembersChunk(GuildMembersChunkPayload),

    ChannelCreate(Box<ChannelPayload>),
    ChannelUpdate(Box<ChannelPayload>),
    ChannelDelete(Box<ChannelPayload>),
    ChannelPinsUpdate(ChannelPinsUpdatePayload),
    ThreadCreate(Box<ChannelPayload>),
    ThreadUpdate(Box<ChannelPayload>),
    ThreadDelete(ThreadDeletePayload),
    ThreadListSync(ThreadListSyncPayload),

    MessageCreate(Box<MessagePayload>),
    MessageUpdate(Box<MessageUpdatePayload>),
    MessageDelete(MessageDeletePayload),
    MessageDeleteBulk(MessageDeleteBulkPayload),

    ReactionAdd(Box<ReactionEventPayload>),
    ReactionRemove(Box<ReactionEventPayload>),
    ReactionRemoveAll(ReactionClearPayload),
    ReactionRemoveEmoji(ReactionClearEmojiPayload),

    PresenceUpdate(Box<PresencePayload>),
    TypingStart(Box<TypingStartPayload>),
    UserUpdate(UserPayload),

    VoiceStateUpdate(Box<VoiceStatePayload>),
    VoiceServerUpdate(VoiceServerUpdatePayload),

    ScheduledEventCreate(Box<ScheduledEventPayload>),
    ScheduledEventUpdate(Box<ScheduledEventPayload>),
    ScheduledEventDelete(Box<ScheduledEventPayload>),
    ScheduledEventUserAdd(ScheduledEventUserPayload),
    ScheduledEventUserRemove(ScheduledEventUserPayload),

    /// Passed through untouched
    InteractionCreate(Value),

    /// Event name this client does not know
    Unknown { name: String, data: Value },
}

fn parse<T: DeserializeOwned>(kind: GatewayEventType, data: Value) -> Result<T, DecodeError> {
    serde_json::from_value(data).map_err(|source| DecodeError {
        event: kind.as_str(),
        source,
    })
}

impl GatewayEvent {
    /// Decode the `d` field of a dispatch frame named `name`
    pub fn decode(name: &str, data: Value) -> Result<Self, DecodeError> {
        use GatewayEventType as T;

        let Some(kind) = GatewayEventType::from_str(name) else {
            return Ok(Self::Unknown {
                name: name.to_string(),
                data,
            });
        };

        let event = match kind {
            T::Ready => Self::Ready(parse(kind, data)?),
            T::Resumed => Self::Resumed,
            T::GuildCreate => {
                if data.get("unavailable").and_then(Value::as_bool) == Some(true) {
                    Self::GuildUnavailable(parse(kind, data)?)
                } else {
                    Self::GuildCreate(parse(kind, data)?)
                }
            }
            T::GuildUpdate => Self::GuildUpdate(parse(kind, data)?),
            T::GuildDelete => Self::GuildDelete(parse(kind, data)?),
            T::GuildEmojisUpdate => Self::GuildEmojisUpdate(parse(kind, data)?),
            T::GuildStickersUpdate => Self::GuildStickersUpdate(parse(kind, data)?),
            T::GuildRoleCreate => Self::GuildRoleCreate(parse(kind, data)?),
            T::GuildRoleUpdate => Self::GuildRoleUpdate(parse(kind, data)?),
            T::GuildRoleDelete => Self::GuildRoleDelete(parse(kind, data)?),
            T::GuildMemberAdd => Self::GuildMemberAdd(parse(kind, data)?),
            T::GuildMemberUpdate => Self::GuildMemberUpdate(parse(kind, data)?),
            T::GuildMemberRemove => Self::GuildMemberRemove(parse(kind, data)?),
            T::GuildMembersChunk => Self::GuildMembersChunk(parse(kind, data)?),
            T::ChannelCreate => Self::ChannelCreate(parse(kind, data)?),
            T::ChannelUpdate => Self::ChannelUpdate(parse(kind, data)?),
            T::ChannelDelete => Self::ChannelDelete(parse(kind, data)?),
            T::ChannelPinsUpdate => Self::ChannelPinsUpdate(parse(kind, data)?),
            T::ThreadCreate => Self::ThreadCreate(parse(kind, data)?),
            T::ThreadUpdate => Self::ThreadUpdate(parse(kind, data)?),
            T::ThreadDelete => Self::ThreadDelete(parse(kind, data)?),
            T::ThreadListSync => Self::ThreadListSync(parse(kind, data)?),
            T::MessageCreate => Self::MessageCreate(parse(kind, data)?),
            T::MessageUpdate => Self::MessageUpdate(parse(kind, data)?),
            T::MessageDelete => Self::MessageDelete(parse(kind, data)?),
            T::MessageDeleteBulk => Self::MessageDeleteBulk(parse(kind, data)?),
            T::MessageReactionAdd => Self::ReactionAdd(parse(kind, data)?),
            T::MessageReactionRemove => Self::ReactionRemove(parse(kind, data)?),
            T::MessageReactionRemoveAll => Self::ReactionRemoveAll(parse(kind, data)?),
            T::MessageReactionRemoveEmoji => Self::ReactionRemoveEmoji(parse(kind, data)?),
            T::PresenceUpdate => Self::PresenceUpdate(parse(kind, data)?),
            T::TypingStart => Self::TypingStart(parse(kind, data)?),
            T::UserUpdate => Self::UserUpdate(parse(kind, data)?),
            T::VoiceStateUpdate => Self::VoiceStateUpdate(parse(kind, data)?),
            T::VoiceServerUpdate => Self::VoiceServerUpdate(parse(kind, data)?),
            T::GuildScheduledEventCreate => Self::ScheduledEventCreate(parse(kind, data)?),
            T::GuildScheduledEventUpdate => Self::ScheduledEventUpdate(parse(kind, data)?),
            T::GuildScheduledEventDelete => Self::ScheduledEventDelete(parse(kind, data)?),
            T::GuildScheduledEventUserAdd => Self::ScheduledEventUserAdd(parse(kind, data)?),
            T::GuildScheduledEventUserRemove => Self::ScheduledEventUserRemove(parse(kind, data)?),
            T::InteractionCreate => Self::InteractionCreate(data),
        };
        Ok(event)
    }

    /// Wire name of the event
    pub fn name(&self) -> &str {
        use GatewayEventType as T;

        let kind = match self {
            Self::Unknown { name, .. } => return name,
            Self::Ready(_) => T::Ready,
            Self::Resumed => T::Resumed,
            Self::GuildCreate(_) | Self::GuildUnavailable(_) => T::GuildCreate,
            Self::GuildUpdate(_) => T::GuildUpdate,
            Self::GuildDelete(_) => T::GuildDelete,
            Self::GuildEmojisUpdate(_) => T::GuildEmojisUpdate,
            Self::GuildStickersUpdate(_) => T::GuildStickersUpdate,
            Self::GuildRoleCreate(_) => T::GuildRoleCreate,
            Self::GuildRoleUpdate(_) => T::GuildRoleUpdate,
            Self::GuildRoleDelete(_) => T::GuildRoleDelete,
            Self::GuildMemberAdd(_) => T::GuildMemberAdd,
            Self::GuildMemberUpdate(_) => T::GuildMemberUpdate,
            Self::GuildMemberRemove(_) => T::GuildMemberRemove,
            Self::GuildMembersChunk(_) => T::GuildMembersChunk,
            Self::ChannelCreate(_) => T::ChannelCreate,
            Self::ChannelUpdate(_) => T::ChannelUpdate,
            Self::ChannelDelete(_) => T::ChannelDelete,
            Self::ChannelPinsUpdate(_) => T::ChannelPinsUpdate,
            Self::ThreadCreate(_) => T::ThreadCreate,
            Self::ThreadUpdate(_) => T::ThreadUpdate,
            Self::ThreadDelete(_) => T::ThreadDelete,
            Self::ThreadListSync(_) => T::ThreadListSync,
            Self::MessageCreate(_) => T::MessageCreate,
            Self::MessageUpdate(_) => T::MessageUpdate,
            Self::MessageDelete(_) => T::MessageDelete,
            Self::MessageDeleteBulk(_) => T::MessageDeleteBulk,
            Self::ReactionAdd(_) => T::MessageReactionAdd,
            Self::ReactionRemove(_) => T::MessageReactionRemove,
            Self::ReactionRemoveAll(_) => T::MessageReactionRemoveAll,
            Self::ReactionRemoveEmoji(_) => T::MessageReactionRemoveEmoji,
            Self::PresenceUpdate(_) => T::PresenceUpdate,
            Self::TypingStart(_) => T::TypingStart,
            Self::UserUpdate(_) => T::UserUpdate,
            Self::VoiceStateUpdate(_) => T::VoiceStateUpdate,
            Self::VoiceServerUpdate(_) => T::VoiceServerUpdate,
            Self::ScheduledEventCreate(_) => T::GuildScheduledEventCreate,
            Self::ScheduledEventUpdate(_) => T::GuildScheduledEventUpdate,
            Self::ScheduledEventDelete(_) => T::GuildScheduledEventDelete,
            Self::ScheduledEventUserAdd(_) => T::GuildScheduledEventUserAdd,
            Self::ScheduledEventUserRemove(_) => T::GuildScheduledEventUserRemove,
            Self::InteractionCreate(_) => T::InteractionCreate,
        };
        kind.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::Snowflake;
    use serde_json::json;

    #[test]
    fn test_unknown_event_is_kept() {
        let event = GatewayEvent::decode("SOMETHING_NEW", json!({"a": 1})).unwrap();
        assert!(matches!(event, GatewayEvent::Unknown { ref name, .. } if name == "SOMETHING_NEW"));
        assert_eq!(event.name(), "SOMETHING_NEW");
    }

    #[test]
    fn test_guild_create_outage() {
        let event = GatewayEvent::decode("GUILD_CREATE", json!({"id": "1", "unavailable": true})).unwrap();
        assert!(matches!(event, GatewayEvent::GuildUnavailable(ref g) if g.id == Snowflake::new(1)));
        assert_eq!(event.name(), "GUILD_CREATE");
    }

    #[test]
    fn test_malformed_payload_names_the_event() {
        let err = GatewayEvent::decode("MESSAGE_DELETE", json!({"id": "not a number"})).unwrap_err();
        assert_eq!(err.event, "MESSAGE_DELETE");
        assert!(err.to_string().starts_with("failed to decode MESSAGE_DELETE payload"));
    }

    #[test]
    fn test_decode_reaction_add() {
        let event = GatewayEvent::decode(
            "MESSAGE_REACTION_ADD",
            json!({"user_id": "1", "channel_id": "2", "message_id": "3", "emoji": {"id": null, "name": "x"}}),
        )
        .unwrap();
        match event {
            GatewayEvent::ReactionAdd(payload) => assert_eq!(payload.message_id, Snowflake::new(3)),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_resumed_ignores_payload() {
        assert!(matches!(
            GatewayEvent::decode("RESUMED", Value::Null).unwrap(),
            GatewayEvent::Resumed
        ));
    }
}
