//! Cached entities - plain data the connection state keeps in memory

mod channel;
mod emoji;
mod guild;
mod member;
mod message;
mod presence;
mod reaction;
mod role;
mod scheduled_event;
mod user;
mod voice;

pub use channel::{Channel, ChannelType, Thread};
pub use emoji::{Emoji, Sticker};
pub use guild::Guild;
pub use member::Member;
pub use message::{Attachment, Message};
pub use presence::{Presence, Status};
pub use reaction::{PartialEmoji, Reaction};
pub use role::Role;
pub use scheduled_event::{ScheduledEvent, ScheduledEventEntity, ScheduledEventStatus};
pub use user::User;
pub use voice::VoiceState;
