//! Channel entity - guild channels, threads and private channels

use crate::value_objects::Snowflake;

/// Channel type as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelType {
    #[default]
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildAnnouncement,
    AnnouncementThread,
    PublicThread,
    PrivateThread,
    GuildStageVoice,
    GuildDirectory,
    GuildForum,
    GuildMedia,
    /// Types this client does not know yet
    Unknown(u8),
}

impl ChannelType {
    /// Get the numeric value
    pub fn as_u8(self) -> u8 {
        match self {
            Self::GuildText => 0,
            Self::Dm => 1,
            Self::GuildVoice => 2,
            Self::GroupDm => 3,
            Self::GuildCategory => 4,
            Self::GuildAnnouncement => 5,
            Self::AnnouncementThread => 10,
            Self::PublicThread => 11,
            Self::PrivateThread => 12,
            Self::GuildStageVoice => 13,
            Self::GuildDirectory => 14,
            Self::GuildForum => 15,
            Self::GuildMedia => 16,
            Self::Unknown(value) => value,
        }
    }

    /// Threads live in their own per-guild map
    #[inline]
    pub fn is_thread(self) -> bool {
        matches!(
            self,
            Self::AnnouncementThread | Self::PublicThread | Self::PrivateThread
        )
    }

    /// Voice-like channels can host scheduled events and voice states
    #[inline]
    pub fn is_voice(self) -> bool {
        matches!(self, Self::GuildVoice | Self::GuildStageVoice)
    }

    /// DM or group DM
    #[inline]
    pub fn is_private(self) -> bool {
        matches!(self, Self::Dm | Self::GroupDm)
    }
}

impl From<u8> for ChannelType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildAnnouncement,
            10 => Self::AnnouncementThread,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            13 => Self::GuildStageVoice,
            14 => Self::GuildDirectory,
            15 => Self::GuildForum,
            16 => Self::GuildMedia,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChannelType> for u8 {
    fn from(ct: ChannelType) -> Self {
        ct.as_u8()
    }
}

/// Channel entity
///
/// Guild channels carry `guild_id`; private channels carry their recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: Snowflake,
    pub kind: ChannelType,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: i32,
    pub parent_id: Option<Snowflake>,
    pub nsfw: bool,
    pub last_message_id: Option<Snowflake>,
    pub rate_limit_per_user: u32,
    pub bitrate: Option<u32>,
    pub user_limit: Option<u32>,
    pub recipient_ids: Vec<Snowflake>,
    /// Owner of a group DM
    pub owner_id: Option<Snowflake>,
}

impl Channel {
    /// Create a new guild channel
    pub fn new(id: Snowflake, kind: ChannelType, guild_id: Option<Snowflake>) -> Self {
        Self {
            id,
            kind,
            guild_id,
            name: None,
            topic: None,
            position: 0,
            parent_id: None,
            nsfw: false,
            last_message_id: None,
            rate_limit_per_user: 0,
            bitrate: None,
            user_limit: None,
            recipient_ids: Vec::new(),
            owner_id: None,
        }
    }

    /// Create a one-to-one DM channel with `recipient_id`
    pub fn direct_message(id: Snowflake, recipient_id: Snowflake) -> Self {
        let mut channel = Self::new(id, ChannelType::Dm, None);
        channel.recipient_ids.push(recipient_id);
        channel
    }

    /// The other party of a one-to-one DM
    pub fn recipient_id(&self) -> Option<Snowflake> {
        match self.kind {
            ChannelType::Dm => self.recipient_ids.first().copied(),
            _ => None,
        }
    }

    /// Check if this is a private channel
    #[inline]
    pub fn is_private(&self) -> bool {
        self.kind.is_private()
    }

    /// Mention markup for this channel
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }

    /// Fold a fresh copy of the same channel into this one.
    ///
    /// The last message pointer only moves forward.
    pub fn merge(&mut self, other: Channel) {
        let last_message_id = match (self.last_message_id, other.last_message_id) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => b.or(a),
        };
        *self = other;
        self.last_message_id = last_message_id;
    }
}

/// Thread channel, tracked separately from regular guild channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub parent_id: Snowflake,
    pub owner_id: Option<Snowflake>,
    pub kind: ChannelType,
    pub name: String,
    pub archived: bool,
    pub locked: bool,
    pub message_count: u32,
    pub member_count: u32,
    pub last_message_id: Option<Snowflake>,
}

impl Thread {
    /// Create a new thread under `parent_id`
    pub fn new(
        id: Snowflake,
        guild_id: Snowflake,
        parent_id: Snowflake,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            guild_id,
            parent_id,
            owner_id: None,
            kind: ChannelType::PublicThread,
            name: name.into(),
            archived: false,
            locked: false,
            message_count: 0,
            member_count: 0,
            last_message_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_round_trip_known_values() {
        for value in [0u8, 1, 2, 3, 4, 5, 10, 11, 12, 13, 14, 15, 16] {
            assert_eq!(ChannelType::from(value).as_u8(), value);
        }
        assert_eq!(ChannelType::from(99), ChannelType::Unknown(99));
        assert_eq!(ChannelType::Unknown(99).as_u8(), 99);
    }

    #[test]
    fn test_channel_type_predicates() {
        assert!(ChannelType::GuildVoice.is_voice());
        assert!(ChannelType::GuildStageVoice.is_voice());
        assert!(!ChannelType::GuildText.is_voice());
        assert!(ChannelType::PrivateThread.is_thread());
        assert!(ChannelType::GroupDm.is_private());
    }

    #[test]
    fn test_direct_message_recipient() {
        let dm = Channel::direct_message(Snowflake::new(1), Snowflake::new(42));
        assert_eq!(dm.recipient_id(), Some(Snowflake::new(42)));
        assert!(dm.is_private());

        let text = Channel::new(Snowflake::new(2), ChannelType::GuildText, Some(Snowflake::new(3)));
        assert_eq!(text.recipient_id(), None);
    }

    #[test]
    fn test_merge_keeps_newest_last_message() {
        let mut existing = Channel::new(Snowflake::new(1), ChannelType::GuildText, None);
        existing.last_message_id = Some(Snowflake::new(500));

        let mut fresh = existing.clone();
        fresh.name = Some("renamed".to_string());
        fresh.last_message_id = None;

        existing.merge(fresh);
        assert_eq!(existing.name.as_deref(), Some("renamed"));
        assert_eq!(existing.last_message_id, Some(Snowflake::new(500)));
    }
}
