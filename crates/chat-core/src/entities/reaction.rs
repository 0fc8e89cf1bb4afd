//! Reaction entity - an aggregated emoji reaction on a message

use std::fmt;

use crate::value_objects::Snowflake;

/// Emoji as it appears in reactions: custom (with ID) or unicode (name only)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialEmoji {
    pub id: Option<Snowflake>,
    pub name: Option<String>,
    pub animated: bool,
}

impl PartialEmoji {
    /// Unicode emoji
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            animated: false,
        }
    }

    /// Custom guild emoji
    pub fn custom(id: Snowflake, name: impl Into<String>, animated: bool) -> Self {
        Self {
            id: Some(id),
            name: Some(name.into()),
            animated,
        }
    }

    /// Check if this is a custom emoji
    #[inline]
    pub fn is_custom(&self) -> bool {
        self.id.is_some()
    }

    /// Form used in reaction URLs: `name:id` for custom, the bare name otherwise
    pub fn to_route_key(&self) -> String {
        match (self.id, self.name.as_deref()) {
            (Some(id), Some(name)) => format!("{name}:{id}"),
            (Some(id), None) => format!("_:{id}"),
            (None, Some(name)) => name.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Two emojis match when their IDs match, or their names when neither has one
    pub fn matches(&self, other: &PartialEmoji) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.name == other.name,
            _ => false,
        }
    }
}

impl fmt::Display for PartialEmoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("_");
        match self.id {
            Some(id) if self.animated => write!(f, "<a:{name}:{id}>"),
            Some(id) => write!(f, "<:{name}:{id}>"),
            None => f.write_str(name),
        }
    }
}

/// Aggregated reaction on a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub emoji: PartialEmoji,
    pub count: u32,
    /// Whether the current user reacted
    pub me: bool,
}

impl Reaction {
    /// Create a new Reaction with a single reactor
    pub fn new(emoji: PartialEmoji, me: bool) -> Self {
        Self {
            emoji,
            count: 1,
            me,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_key() {
        assert_eq!(PartialEmoji::unicode("👍").to_route_key(), "👍");
        assert_eq!(
            PartialEmoji::custom(Snowflake::new(5), "blob", false).to_route_key(),
            "blob:5"
        );
    }

    #[test]
    fn test_matches() {
        let a = PartialEmoji::custom(Snowflake::new(5), "blob", false);
        let renamed = PartialEmoji::custom(Snowflake::new(5), "blob2", false);
        assert!(a.matches(&renamed));
        assert!(!a.matches(&PartialEmoji::unicode("blob")));
        assert!(PartialEmoji::unicode("x").matches(&PartialEmoji::unicode("x")));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            PartialEmoji::custom(Snowflake::new(5), "blob", true).to_string(),
            "<a:blob:5>"
        );
        assert_eq!(PartialEmoji::unicode("x").to_string(), "x");
    }
}
