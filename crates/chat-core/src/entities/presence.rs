//! Presence entity - online status and activities of a guild member

use crate::value_objects::Snowflake;

/// Online status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    Online,
    Idle,
    #[default]
    Offline,
    DoNotDisturb,
    Invisible,
}

impl Status {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::Offline => "offline",
            Self::DoNotDisturb => "dnd",
            Self::Invisible => "invisible",
        }
    }

    /// Parse the wire representation, unknown values map to offline
    pub fn from_str(s: &str) -> Self {
        match s {
            "online" => Self::Online,
            "idle" => Self::Idle,
            "dnd" => Self::DoNotDisturb,
            "invisible" => Self::Invisible,
            _ => Self::Offline,
        }
    }
}

/// Presence of one user in one guild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub user_id: Snowflake,
    pub guild_id: Snowflake,
    pub status: Status,
    pub desktop: Option<Status>,
    pub mobile: Option<Status>,
    pub web: Option<Status>,
    /// Activities are passed through untouched
    pub activities: Vec<serde_json::Value>,
}

impl Presence {
    pub fn new(user_id: Snowflake, guild_id: Snowflake, status: Status) -> Self {
        Self {
            user_id,
            guild_id,
            status,
            desktop: None,
            mobile: None,
            web: None,
            activities: Vec::new(),
        }
    }

    /// Offline presences are not worth keeping
    #[inline]
    pub fn is_offline(&self) -> bool {
        self.status == Status::Offline
    }
}
