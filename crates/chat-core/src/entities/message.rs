//! Message entity - a cached chat message and its reactions

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

use super::{PartialEmoji, Reaction};

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub author_id: Snowflake,
    pub webhook_id: Option<Snowflake>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub edited_timestamp: Option<DateTime<Utc>>,
    pub tts: bool,
    pub mention_everyone: bool,
    pub mention_ids: Vec<Snowflake>,
    pub mention_role_ids: Vec<Snowflake>,
    pub pinned: bool,
    pub kind: u8,
    pub reference_id: Option<Snowflake>,
    pub attachments: Vec<Attachment>,
    pub embeds: Vec<serde_json::Value>,
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// Create a new Message
    pub fn new(
        id: Snowflake,
        channel_id: Snowflake,
        author_id: Snowflake,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            channel_id,
            guild_id: None,
            author_id,
            webhook_id: None,
            content: content.into(),
            timestamp: id.created_at(),
            edited_timestamp: None,
            tts: false,
            mention_everyone: false,
            mention_ids: Vec::new(),
            mention_role_ids: Vec::new(),
            pinned: false,
            kind: 0,
            reference_id: None,
            attachments: Vec::new(),
            embeds: Vec::new(),
            reactions: Vec::new(),
        }
    }

    /// Check if message has been edited
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_timestamp.is_some()
    }

    /// Check if message is a reply
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reference_id.is_some()
    }

    /// Find the reaction for `emoji`
    pub fn reaction(&self, emoji: &PartialEmoji) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.emoji.matches(emoji))
    }

    /// Count one more reactor for `emoji` and return the updated reaction
    pub fn add_reaction(&mut self, emoji: PartialEmoji, is_me: bool) -> Reaction {
        if let Some(reaction) = self.reactions.iter_mut().find(|r| r.emoji.matches(&emoji)) {
            reaction.count += 1;
            reaction.me |= is_me;
            return reaction.clone();
        }

        let reaction = Reaction::new(emoji, is_me);
        self.reactions.push(reaction.clone());
        reaction
    }

    /// Count one reactor less for `emoji`.
    ///
    /// Returns the reaction as it stands after removal, or `None` when the
    /// emoji was not on the message. Reactions dropping to zero are removed.
    pub fn remove_reaction(&mut self, emoji: &PartialEmoji, is_me: bool) -> Option<Reaction> {
        let pos = self.reactions.iter().position(|r| r.emoji.matches(emoji))?;
        let reaction = &mut self.reactions[pos];
        reaction.count = reaction.count.saturating_sub(1);
        if is_me {
            reaction.me = false;
        }
        let snapshot = reaction.clone();
        if snapshot.count == 0 {
            self.reactions.remove(pos);
        }
        Some(snapshot)
    }

    /// Drop every reaction for `emoji`
    pub fn clear_emoji(&mut self, emoji: &PartialEmoji) -> Option<Reaction> {
        let pos = self.reactions.iter().position(|r| r.emoji.matches(emoji))?;
        Some(self.reactions.remove(pos))
    }

    /// Drop all reactions, returning what was there
    pub fn clear_reactions(&mut self) -> Vec<Reaction> {
        std::mem::take(&mut self.reactions)
    }
}

/// File attached to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: Snowflake,
    pub filename: String,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
    pub url: String,
    pub proxy_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Attachment {
    /// Create a new Attachment
    pub fn new(id: Snowflake, filename: impl Into<String>, size: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            description: None,
            content_type: None,
            size,
            url: url.into(),
            proxy_url: None,
            width: None,
            height: None,
        }
    }

    /// Check if attachment is an image
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }

    /// Spoilered attachments carry the `SPOILER_` filename prefix
    pub fn is_spoiler(&self) -> bool {
        self.filename.starts_with("SPOILER_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message::new(
            Snowflake::new(175_928_847_299_117_063),
            Snowflake::new(100),
            Snowflake::new(200),
            "Hello, world!",
        )
    }

    #[test]
    fn test_message_timestamp_from_id() {
        let msg = message();
        assert_eq!(msg.timestamp.timestamp_millis(), 1_462_015_105_796);
        assert!(!msg.is_edited());
        assert!(!msg.is_reply());
    }

    #[test]
    fn test_add_reaction_aggregates() {
        let mut msg = message();
        let thumbs = PartialEmoji::unicode("👍");

        msg.add_reaction(thumbs.clone(), false);
        let reaction = msg.add_reaction(thumbs.clone(), true);

        assert_eq!(reaction.count, 2);
        assert!(reaction.me);
        assert_eq!(msg.reactions.len(), 1);
    }

    #[test]
    fn test_remove_reaction_drops_empty() {
        let mut msg = message();
        let thumbs = PartialEmoji::unicode("👍");
        msg.add_reaction(thumbs.clone(), true);

        let after = msg.remove_reaction(&thumbs, true).unwrap();
        assert_eq!(after.count, 0);
        assert!(!after.me);
        assert!(msg.reactions.is_empty());

        assert!(msg.remove_reaction(&thumbs, false).is_none());
    }

    #[test]
    fn test_clear_emoji_and_all() {
        let mut msg = message();
        let a = PartialEmoji::unicode("a");
        let b = PartialEmoji::custom(Snowflake::new(9), "b", false);
        msg.add_reaction(a.clone(), false);
        msg.add_reaction(b.clone(), false);

        assert!(msg.clear_emoji(&a).is_some());
        assert!(msg.reaction(&a).is_none());
        assert_eq!(msg.clear_reactions().len(), 1);
        assert!(msg.reactions.is_empty());
    }

    #[test]
    fn test_attachment_spoiler() {
        let file = Attachment::new(Snowflake::new(1), "SPOILER_cat.png", 10, "https://cdn/cat");
        assert!(file.is_spoiler());
        assert!(!file.is_image());
    }
}
