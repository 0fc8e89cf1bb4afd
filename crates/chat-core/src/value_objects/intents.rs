//! Gateway intents and member cache flags
//!
//! Both are plain bitfields; intents are sent to the gateway on identify,
//! cache flags only steer what the client keeps in memory.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Gateway intents (which event groups the session subscribes to)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u64 {
        const GUILDS                    = 1 << 0;
        /// Privileged: member add/update/remove and member chunking
        const GUILD_MEMBERS             = 1 << 1;
        const GUILD_MODERATION          = 1 << 2;
        const GUILD_EXPRESSIONS         = 1 << 3;
        const GUILD_INTEGRATIONS        = 1 << 4;
        const GUILD_WEBHOOKS            = 1 << 5;
        const GUILD_INVITES             = 1 << 6;
        const GUILD_VOICE_STATES        = 1 << 7;
        /// Privileged: presence updates for every member
        const GUILD_PRESENCES           = 1 << 8;
        const GUILD_MESSAGES            = 1 << 9;
        const GUILD_MESSAGE_REACTIONS   = 1 << 10;
        const GUILD_MESSAGE_TYPING      = 1 << 11;
        const DIRECT_MESSAGES           = 1 << 12;
        const DIRECT_MESSAGE_REACTIONS  = 1 << 13;
        const DIRECT_MESSAGE_TYPING     = 1 << 14;
        /// Privileged: message content on events
        const MESSAGE_CONTENT           = 1 << 15;
        const GUILD_SCHEDULED_EVENTS    = 1 << 16;
    }
}

impl Intents {
    /// Intents the platform gates behind explicit approval
    pub const PRIVILEGED: Self = Self::GUILD_MEMBERS
        .union(Self::GUILD_PRESENCES)
        .union(Self::MESSAGE_CONTENT);

    /// Every intent that does not need to be enabled in the developer portal
    pub const DEFAULT: Self = Self::from_bits_truncate(Self::all().bits() & !Self::PRIVILEGED.bits());

    /// Check whether any privileged intent is requested
    #[inline]
    pub fn is_privileged(&self) -> bool {
        self.intersects(Self::PRIVILEGED)
    }
}

impl Default for Intents {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Serialize for Intents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Intents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

bitflags! {
    /// Which members the client retains in its guild member maps
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberCacheFlags: u8 {
        /// Keep members that are connected to a voice channel
        const VOICE  = 1 << 0;
        /// Keep members that joined or were chunked during the session
        const JOINED = 1 << 1;
    }
}

impl MemberCacheFlags {
    /// Derive the retention policy the intents can actually support
    pub fn from_intents(intents: Intents) -> Self {
        let mut flags = Self::empty();
        if intents.contains(Intents::GUILD_VOICE_STATES) {
            flags |= Self::VOICE;
        }
        if intents.contains(Intents::GUILD_MEMBERS) {
            flags |= Self::JOINED;
        }
        flags
    }

    /// Whether a member with the given voice status should stay cached
    #[inline]
    pub fn retains(&self, in_voice: bool) -> bool {
        self.contains(Self::JOINED) || (in_voice && self.contains(Self::VOICE))
    }
}

impl Default for MemberCacheFlags {
    fn default() -> Self {
        Self::all()
    }
}
