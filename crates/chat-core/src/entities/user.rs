//! User entity - a platform account as seen by the client

use crate::value_objects::Snowflake;

/// User entity
///
/// Cached once per ID in the shared user table; members, private channels and
/// cached messages refer to it by ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    /// Legacy four-digit discriminator, `"0"` for migrated accounts
    pub discriminator: String,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
    pub system: bool,
}

impl User {
    /// Create a new User with required fields
    pub fn new(id: Snowflake, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            discriminator: "0".to_string(),
            global_name: None,
            avatar: None,
            bot: false,
            system: false,
        }
    }

    /// Name shown in clients: global name if set, otherwise the username
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    /// Get the tag: `username#discriminator`, or just the username once migrated
    pub fn tag(&self) -> String {
        if self.is_migrated() {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }

    /// Mention markup for this user
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// Whether the account uses unique usernames instead of discriminators
    #[inline]
    pub fn is_migrated(&self) -> bool {
        self.discriminator == "0"
    }

    /// Get avatar URL path or the default avatar path
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) if hash.starts_with("a_") => {
                format!("/avatars/{}/{}.gif", self.id, hash)
            }
            Some(hash) => format!("/avatars/{}/{}.png", self.id, hash),
            None => format!("/embed/avatars/{}.png", self.default_avatar_index()),
        }
    }

    /// Default avatar index: derived from the ID for migrated accounts,
    /// from the discriminator otherwise
    fn default_avatar_index(&self) -> u64 {
        if self.is_migrated() {
            (self.id.get() >> 22) % 6
        } else {
            self.discriminator.parse::<u64>().unwrap_or(0) % 5
        }
    }

    /// Compare the fields a user update can change
    ///
    /// Returns true when `other` differs in a way consumers would notice.
    pub fn differs_from(&self, other: &User) -> bool {
        self.username != other.username
            || self.discriminator != other.discriminator
            || self.global_name != other.global_name
            || self.avatar != other.avatar
    }
}
