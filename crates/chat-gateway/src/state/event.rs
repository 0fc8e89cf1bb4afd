//! Public events
//!
//! What the connection state hands to the application after applying a
//! gateway event to the cache. Update events carry `(old, new)` snapshots;
//! `Raw*` variants are emitted whether or not the target was cached.

use chat_core::{
    Channel, Emoji, Guild, Member, Message, Presence, Reaction, Role, ScheduledEvent, Snowflake,
    Sticker, Thread, User, VoiceState,
};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::events::payloads::{
    MessageDeleteBulkPayload, MessageDeletePayload, MessageUpdatePayload, ReactionClearEmojiPayload,
    ReactionClearPayload, ReactionEventPayload, ThreadDeletePayload, VoiceServerUpdatePayload,
};

#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum Event {
    // Session
    /// Every guild of the shard has been received, or waited out
    ShardReady(u32),
    /// All configured shards are ready
    Ready,
    Resumed(u32),
    /// The shard lost its session; its cached state was dropped
    SessionInvalidated(u32),

    // Guilds
    GuildAvailable(Guild),
    GuildUnavailable(Guild),
    GuildJoin(Guild),
    GuildRemove(Guild),
    GuildUpdate { old: Guild, new: Guild },
    EmojisUpdate { guild_id: Snowflake, old: Vec<Emoji>, new: Vec<Emoji> },
    StickersUpdate { guild_id: Snowflake, old: Vec<Sticker>, new: Vec<Sticker> },
    RoleCreate(Role),
    RoleUpdate { old: Role, new: Role },
    RoleDelete(Role),

    // Members and users
    MemberJoin(Member),
    MemberUpdate { old: Member, new: Member },
    MemberRemove(Member),
    RawMemberRemove { guild_id: Snowflake, user: User },
    UserUpdate { old: User, new: User },
    PresenceUpdate { old: Option<Presence>, new: Presence },

    // Channels and threads
    ChannelCreate(Channel),
    ChannelUpdate { old: Channel, new: Channel },
    ChannelDelete(Channel),
    ChannelPinsUpdate {
        channel_id: Snowflake,
        guild_id: Option<Snowflake>,
        last_pin: Option<DateTime<Utc>>,
    },
    ThreadCreate(Thread),
    ThreadUpdate { old: Thread, new: Thread },
    ThreadDelete(Thread),
    RawThreadDelete(ThreadDeletePayload),

    // Messages
    Message(Message),
    MessageEdit { old: Message, new: Message },
    RawMessageEdit(MessageUpdatePayload),
    MessageDelete(Message),
    RawMessageDelete(MessageDeletePayload),
    BulkMessageDelete(Vec<Message>),
    RawBulkMessageDelete(MessageDeleteBulkPayload),
    Typing {
        channel_id: Snowflake,
        guild_id: Option<Snowflake>,
        user_id: Snowflake,
        at: DateTime<Utc>,
    },

    // Reactions
    ReactionAdd {
        channel_id: Snowflake,
        message_id: Snowflake,
        user_id: Snowflake,
        reaction: Reaction,
    },
    RawReactionAdd(ReactionEventPayload),
    ReactionRemove {
        channel_id: Snowflake,
        message_id: Snowflake,
        user_id: Snowflake,
        reaction: Reaction,
    },
    RawReactionRemove(ReactionEventPayload),
    ReactionClear { message: Message, reactions: Vec<Reaction> },
    RawReactionClear(ReactionClearPayload),
    ReactionClearEmoji { message: Message, reaction: Reaction },
    RawReactionClearEmoji(ReactionClearEmojiPayload),

    // Voice
    VoiceStateUpdate {
        guild_id: Option<Snowflake>,
        user_id: Snowflake,
        before: Option<VoiceState>,
        after: VoiceState,
    },
    VoiceServerUpdate(VoiceServerUpdatePayload),

    // Scheduled events
    ScheduledEventCreate(ScheduledEvent),
    ScheduledEventUpdate { old: ScheduledEvent, new: ScheduledEvent },
    ScheduledEventDelete(ScheduledEvent),
    ScheduledEventUserAdd { event: ScheduledEvent, user_id: Snowflake },
    ScheduledEventUserRemove { event: ScheduledEvent, user_id: Snowflake },

    InteractionCreate(Value),
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShardReady(_) => "shard_ready",
            Self::Ready => "ready",
            Self::Resumed(_) => "resumed",
            Self::SessionInvalidated(_) => "session_invalidated",
            Self::GuildAvailable(_) => "guild_available",
            Self::GuildUnavailable(_) => "guild_unavailable",
            Self::GuildJoin(_) => "guild_join",
            Self::GuildRemove(_) => "guild_remove",
            Self::GuildUpdate { .. } => "guild_update",
            Self::EmojisUpdate { .. } => "emojis_update",
            Self::StickersUpdate { .. } => "stickers_update",
            Self::RoleCreate(_) => "role_create",
            Self::RoleUpdate { .. } => "role_update",
            Self::RoleDelete(_) => "role_delete",
            Self::MemberJoin(_) => "member_join",
            Self::MemberUpdate { .. } => "member_update",
            Self::MemberRemove(_) => "member_remove",
            Self::RawMemberRemove { .. } => "raw_member_remove",
            Self::UserUpdate { .. } => "user_update",
            Self::PresenceUpdate { .. } => "presence_update",
            Self::ChannelCreate(_) => "channel_create",
            Self::ChannelUpdate { .. } => "channel_update",
            Self::ChannelDelete(_) => "channel_delete",
            Self::ChannelPinsUpdate { .. } => "channel_pins_update",
            Self::ThreadCreate(_) => "thread_create",
            Self::ThreadUpdate { .. } => "thread_update",
            Self::ThreadDelete(_) => "thread_delete",
            Self::RawThreadDelete(_) => "raw_thread_delete",
            Self::Message(_) => "message",
            Self::MessageEdit { .. } => "message_edit",
            Self::RawMessageEdit(_) => "raw_message_edit",
            Self::MessageDelete(_) => "message_delete",
            Self::RawMessageDelete(_) => "raw_message_delete",
            Self::BulkMessageDelete(_) => "bulk_message_delete",
            Self::RawBulkMessageDelete(_) => "raw_bulk_message_delete",
            Self::Typing { .. } => "typing",
            Self::ReactionAdd { .. } => "reaction_add",
            Self::RawReactionAdd(_) => "raw_reaction_add",
            Self::ReactionRemove { .. } => "reaction_remove",
            Self::RawReactionRemove(_) => "raw_reaction_remove",
            Self::ReactionClear { .. } => "reaction_clear",
            Self::RawReactionClear(_) => "raw_reaction_clear",
            Self::ReactionClearEmoji { .. } => "reaction_clear_emoji",
            Self::RawReactionClearEmoji(_) => "raw_reaction_clear_emoji",
            Self::VoiceStateUpdate { .. } => "voice_state_update",
            Self::VoiceServerUpdate(_) => "voice_server_update",
            Self::ScheduledEventCreate(_) => "scheduled_event_create",
            Self::ScheduledEventUpdate { .. } => "scheduled_event_update",
            Self::ScheduledEventDelete(_) => "scheduled_event_delete",
            Self::ScheduledEventUserAdd { .. } => "scheduled_event_user_add",
            Self::ScheduledEventUserRemove { .. } => "scheduled_event_user_remove",
            Self::InteractionCreate(_) => "interaction_create",
        }
    }
}
