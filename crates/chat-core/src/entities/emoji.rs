//! Guild emoji and sticker entities

use crate::value_objects::Snowflake;

use super::PartialEmoji;

/// Custom guild emoji
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emoji {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    pub animated: bool,
    pub available: bool,
    pub managed: bool,
    pub require_colons: bool,
    pub role_ids: Vec<Snowflake>,
}

impl Emoji {
    pub fn new(id: Snowflake, guild_id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            guild_id,
            name: name.into(),
            animated: false,
            available: true,
            managed: false,
            require_colons: true,
            role_ids: Vec::new(),
        }
    }

    /// Reaction form of this emoji
    pub fn to_partial(&self) -> PartialEmoji {
        PartialEmoji::custom(self.id, self.name.clone(), self.animated)
    }
}

/// Guild sticker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sticker {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    pub description: Option<String>,
    pub format_type: u8,
    pub available: bool,
}

impl Sticker {
    pub fn new(id: Snowflake, guild_id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            guild_id,
            name: name.into(),
            description: None,
            format_type: 1,
            available: true,
        }
    }
}
