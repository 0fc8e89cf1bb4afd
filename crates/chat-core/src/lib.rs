//! # chat-core
//!
//! Domain layer containing snowflakes, cached entities, gateway intents and
//! member cache flags. This crate has no I/O and no async runtime.

pub mod entities;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Attachment, Channel, ChannelType, Emoji, Guild, Member, Message, PartialEmoji, Presence,
    Reaction, Role, ScheduledEvent, ScheduledEventEntity, ScheduledEventStatus, Status, Sticker,
    Thread, User, VoiceState,
};
pub use value_objects::{Intents, MemberCacheFlags, Snowflake, SnowflakeParseError};
