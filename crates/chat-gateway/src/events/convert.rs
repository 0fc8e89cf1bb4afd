//! Conversions from wire payloads to cached entities
//!
//! Payloads are borrowed; the entities own their data. Timestamps are
//! RFC 3339 on the wire and unparsable ones are dropped.

use chat_core::{
    Attachment, Channel, ChannelType, Emoji, Guild, Member, Message, PartialEmoji, Presence,
    Reaction, Role, ScheduledEvent, Snowflake, Status, Sticker, Thread, User, VoiceState,
};
use chrono::{DateTime, Utc};

use super::payloads::{
    AttachmentPayload, ChannelPayload, EmojiPayload, GuildPayload, MemberPayload,
    MessagePayload, MessageUpdatePayload, PartialEmojiPayload, PartialUserPayload,
    PresencePayload, RolePayload, ScheduledEventPayload, StickerPayload, UserPayload,
    VoiceStatePayload,
};

/// Parse an RFC 3339 timestamp
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_opt(value: Option<&String>) -> Option<DateTime<Utc>> {
    value.and_then(|v| parse_timestamp(v))
}

impl UserPayload {
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            discriminator: self.discriminator.clone(),
            global_name: self.global_name.clone(),
            avatar: self.avatar.clone(),
            bot: self.bot,
            system: self.system,
        }
    }
}

impl PartialUserPayload {
    /// Apply the fields present on this partial user to `user`.
    ///
    /// Returns the updated copy, or `None` when nothing changed.
    pub fn apply_to(&self, user: &User) -> Option<User> {
        let mut updated = user.clone();
        if let Some(username) = &self.username {
            updated.username.clone_from(username);
        }
        if let Some(discriminator) = &self.discriminator {
            updated.discriminator.clone_from(discriminator);
        }
        if self.global_name.is_some() {
            updated.global_name.clone_from(&self.global_name);
        }
        if self.avatar.is_some() {
            updated.avatar.clone_from(&self.avatar);
        }
        updated.differs_from(user).then_some(updated)
    }
}

impl RolePayload {
    pub fn to_role(&self, guild_id: Snowflake) -> Role {
        Role {
            id: self.id,
            guild_id,
            name: self.name.clone(),
            color: self.color,
            hoist: self.hoist,
            position: self.position,
            permissions: self.permissions.parse().unwrap_or(0),
            managed: self.managed,
            mentionable: self.mentionable,
            icon: self.icon.clone(),
        }
    }
}

impl EmojiPayload {
    pub fn to_emoji(&self, guild_id: Snowflake) -> Emoji {
        Emoji {
            id: self.id,
            guild_id,
            name: self.name.clone(),
            animated: self.animated,
            available: self.available,
            managed: self.managed,
            require_colons: self.require_colons,
            role_ids: self.roles.clone(),
        }
    }
}

impl PartialEmojiPayload {
    pub fn to_partial(&self) -> PartialEmoji {
        PartialEmoji {
            id: self.id,
            name: self.name.clone(),
            animated: self.animated,
        }
    }
}

impl StickerPayload {
    pub fn to_sticker(&self, guild_id: Snowflake) -> Sticker {
        Sticker {
            id: self.id,
            guild_id,
            name: self.name.clone(),
            description: self.description.clone(),
            format_type: self.format_type,
            available: self.available,
        }
    }
}

impl MemberPayload {
    pub fn user_id(&self) -> Option<Snowflake> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn to_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Member {
        Member {
            guild_id,
            user_id,
            nick: self.nick.clone(),
            avatar: self.avatar.clone(),
            role_ids: self.roles.clone(),
            joined_at: parse_opt(self.joined_at.as_ref()),
            premium_since: parse_opt(self.premium_since.as_ref()),
            communication_disabled_until: parse_opt(self.communication_disabled_until.as_ref()),
            deaf: self.deaf,
            mute: self.mute,
            pending: self.pending,
            flags: self.flags,
        }
    }

    /// Member and user, when the payload carries its user
    pub fn to_member_and_user(&self, guild_id: Snowflake) -> Option<(Member, User)> {
        let user = self.user.as_ref()?;
        Some((self.to_member(guild_id, user.id), user.to_user()))
    }
}

impl ChannelPayload {
    pub fn channel_type(&self) -> ChannelType {
        ChannelType::from(self.kind)
    }

    pub fn is_thread(&self) -> bool {
        self.channel_type().is_thread()
    }

    /// Build the channel, filling in `guild_id` when the payload omits it
    pub fn to_channel(&self, guild_id: Option<Snowflake>) -> Channel {
        Channel {
            id: self.id,
            kind: self.channel_type(),
            guild_id: self.guild_id.or(guild_id),
            name: self.name.clone(),
            topic: self.topic.clone(),
            position: self.position.unwrap_or(0),
            parent_id: self.parent_id,
            nsfw: self.nsfw,
            last_message_id: self.last_message_id,
            rate_limit_per_user: self.rate_limit_per_user.unwrap_or(0),
            bitrate: self.bitrate,
            user_limit: self.user_limit,
            recipient_ids: self.recipients.iter().map(|u| u.id).collect(),
            owner_id: self.owner_id,
        }
    }

    /// Build a thread; `None` without a guild or parent
    pub fn to_thread(&self, guild_id: Option<Snowflake>) -> Option<Thread> {
        let guild_id = self.guild_id.or(guild_id)?;
        let parent_id = self.parent_id?;
        let metadata = self.thread_metadata.as_ref();
        Some(Thread {
            id: self.id,
            guild_id,
            parent_id,
            owner_id: self.owner_id,
            kind: self.channel_type(),
            name: self.name.clone().unwrap_or_default(),
            archived: metadata.is_some_and(|m| m.archived),
            locked: metadata.is_some_and(|m| m.locked),
            message_count: self.message_count.unwrap_or(0),
            member_count: self.member_count.unwrap_or(0),
            last_message_id: self.last_message_id,
        })
    }

    pub fn recipients(&self) -> Vec<User> {
        self.recipients.iter().map(UserPayload::to_user).collect()
    }
}

impl VoiceStatePayload {
    pub fn to_voice_state(&self, guild_id: Option<Snowflake>) -> VoiceState {
        VoiceState {
            guild_id: self.guild_id.or(guild_id),
            channel_id: self.channel_id,
            user_id: self.user_id,
            session_id: self.session_id.clone(),
            deaf: self.deaf,
            mute: self.mute,
            self_deaf: self.self_deaf,
            self_mute: self.self_mute,
            self_stream: self.self_stream,
            self_video: self.self_video,
            suppress: self.suppress,
            request_to_speak_at: parse_opt(self.request_to_speak_timestamp.as_ref()),
        }
    }
}

impl PresencePayload {
    pub fn to_presence(&self, guild_id: Snowflake) -> Presence {
        let status = |s: &Option<String>| s.as_deref().map(Status::from_str);
        Presence {
            user_id: self.user.id,
            guild_id: self.guild_id.unwrap_or(guild_id),
            status: Status::from_str(&self.status),
            desktop: status(&self.client_status.desktop),
            mobile: status(&self.client_status.mobile),
            web: status(&self.client_status.web),
            activities: self.activities.clone(),
        }
    }
}

impl ScheduledEventPayload {
    pub fn to_scheduled_event(&self) -> ScheduledEvent {
        ScheduledEvent {
            id: self.id,
            guild_id: self.guild_id,
            channel_id: self.channel_id,
            creator_id: self.creator_id,
            name: self.name.clone(),
            description: self.description.clone(),
            scheduled_start_time: parse_opt(self.scheduled_start_time.as_ref()),
            scheduled_end_time: parse_opt(self.scheduled_end_time.as_ref()),
            status: self.status.into(),
            entity_type: self.entity_type.into(),
            location: self
                .entity_metadata
                .as_ref()
                .and_then(|m| m.location.clone()),
            user_count: self.user_count.unwrap_or(0),
        }
    }
}

impl AttachmentPayload {
    pub fn to_attachment(&self) -> Attachment {
        Attachment {
            id: self.id,
            filename: self.filename.clone(),
            description: self.description.clone(),
            content_type: self.content_type.clone(),
            size: self.size,
            url: self.url.clone(),
            proxy_url: self.proxy_url.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

impl MessagePayload {
    pub fn to_message(&self) -> Message {
        Message {
            id: self.id,
            channel_id: self.channel_id,
            guild_id: self.guild_id,
            author_id: self.author.id,
            webhook_id: self.webhook_id,
            content: self.content.clone(),
            timestamp: parse_opt(self.timestamp.as_ref()).unwrap_or_else(|| self.id.created_at()),
            edited_timestamp: parse_opt(self.edited_timestamp.as_ref()),
            tts: self.tts,
            mention_everyone: self.mention_everyone,
            mention_ids: self.mentions.iter().map(|u| u.id).collect(),
            mention_role_ids: self.mention_roles.clone(),
            pinned: self.pinned,
            kind: self.kind,
            reference_id: self.message_reference.as_ref().and_then(|r| r.message_id),
            attachments: self.attachments.iter().map(AttachmentPayload::to_attachment).collect(),
            embeds: self.embeds.clone(),
            reactions: self
                .reactions
                .iter()
                .map(|r| Reaction {
                    emoji: r.emoji.to_partial(),
                    count: r.count,
                    me: r.me,
                })
                .collect(),
        }
    }
}

impl MessageUpdatePayload {
    /// Apply the fields present on this update to a cached message
    pub fn apply(&self, message: &mut Message) {
        if let Some(content) = &self.content {
            message.content.clone_from(content);
        }
        if let Some(edited) = &self.edited_timestamp {
            message.edited_timestamp = parse_timestamp(edited);
        }
        if let Some(pinned) = self.pinned {
            message.pinned = pinned;
        }
        if let Some(mention_everyone) = self.mention_everyone {
            message.mention_everyone = mention_everyone;
        }
        if let Some(mentions) = &self.mentions {
            message.mention_ids = mentions.iter().map(|u| u.id).collect();
        }
        if let Some(roles) = &self.mention_roles {
            message.mention_role_ids.clone_from(roles);
        }
        if let Some(attachments) = &self.attachments {
            message.attachments = attachments.iter().map(AttachmentPayload::to_attachment).collect();
        }
        if let Some(embeds) = &self.embeds {
            message.embeds.clone_from(embeds);
        }
    }
}

impl GuildPayload {
    /// Build the guild with every nested collection.
    ///
    /// Returns the users of the members that carried one.
    pub fn to_guild(&self) -> (Guild, Vec<User>) {
        let mut guild = Guild::new(self.id, self.name.clone(), self.owner_id);
        guild.icon.clone_from(&self.icon);
        guild.description.clone_from(&self.description);
        guild.large = self.large;
        guild.unavailable = self.unavailable;
        guild.emojis = self.emojis.iter().map(|e| e.to_emoji(self.id)).collect::<Vec<_>>().into();
        guild.stickers = self.stickers.iter().map(|s| s.to_sticker(self.id)).collect::<Vec<_>>().into();

        let roles = guild.roles_mut();
        for role in &self.roles {
            roles.insert(role.id, role.to_role(self.id));
        }
        let channels = guild.channels_mut();
        for channel in &self.channels {
            channels.insert(channel.id, channel.to_channel(Some(self.id)));
        }
        let threads = guild.threads_mut();
        for thread in self.threads.iter().filter_map(|t| t.to_thread(Some(self.id))) {
            threads.insert(thread.id, thread);
        }

        let mut users = Vec::with_capacity(self.members.len());
        let members = guild.members_mut();
        for payload in &self.members {
            if let Some((member, user)) = payload.to_member_and_user(self.id) {
                members.insert(member.user_id, member);
                users.push(user);
            }
        }

        let voice_states = guild.voice_states_mut();
        for state in &self.voice_states {
            voice_states.insert(state.user_id, state.to_voice_state(Some(self.id)));
        }
        let presences = guild.presences_mut();
        for presence in &self.presences {
            presences.insert(presence.user.id, presence.to_presence(self.id));
        }
        let events = guild.scheduled_events_mut();
        for event in &self.guild_scheduled_events {
            events.insert(event.id, event.to_scheduled_event());
        }

        guild.member_count = self
            .member_count
            .unwrap_or(guild.cached_member_count() as u64);
        (guild, users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn guild_payload() -> GuildPayload {
        serde_json::from_value(json!({
            "id": "100",
            "name": "guild",
            "owner_id": "1",
            "member_count": 2,
            "large": false,
            "roles": [{"id": "100", "name": "@everyone", "permissions": "104324673"}],
            "emojis": [{"id": "7", "name": "blob"}],
            "channels": [
                {"id": "10", "type": 0, "name": "general"},
                {"id": "11", "type": 2, "name": "voice", "bitrate": 64000}
            ],
            "threads": [{"id": "12", "type": 11, "name": "thread", "parent_id": "10",
                         "thread_metadata": {"archived": false, "locked": true}}],
            "members": [
                {"user": {"id": "1", "username": "owner"}, "roles": [], "joined_at": "2024-01-01T00:00:00+00:00"},
                {"user": {"id": "2", "username": "other"}, "roles": ["100"]}
            ],
            "voice_states": [{"user_id": "2", "channel_id": "11", "session_id": "s"}],
            "presences": [{"user": {"id": "2"}, "status": "dnd", "client_status": {"mobile": "dnd"}}],
            "guild_scheduled_events": [{"id": "50", "guild_id": "100", "channel_id": "11",
                                        "name": "standup", "status": 1, "entity_type": 2}]
        }))
        .unwrap()
    }

    #[test]
    fn test_guild_payload_to_guild() {
        let (guild, users) = guild_payload().to_guild();

        assert_eq!(guild.member_count, 2);
        assert_eq!(users.len(), 2);
        assert_eq!(guild.default_role().unwrap().permissions, 104_324_673);
        assert_eq!(guild.channel(Snowflake::new(10)).unwrap().guild_id, Some(guild.id));
        assert!(guild.thread(Snowflake::new(12)).unwrap().locked);
        assert!(guild.member(Snowflake::new(1)).unwrap().joined_at.is_some());
        assert_eq!(guild.voice_state(Snowflake::new(2)).unwrap().guild_id, Some(guild.id));
        let presence = guild.presence(Snowflake::new(2)).unwrap();
        assert_eq!(presence.status, Status::DoNotDisturb);
        assert_eq!(presence.mobile, Some(Status::DoNotDisturb));
        assert_eq!(guild.emojis[0].guild_id, guild.id);
        assert!(guild.scheduled_event(Snowflake::new(50)).is_some());
    }

    #[test]
    fn test_message_payload_falls_back_to_snowflake_time() {
        let payload: MessagePayload = serde_json::from_value(json!({
            "id": "175928847299117063",
            "channel_id": "2",
            "author": {"id": "3", "username": "a"},
            "content": "hello",
            "mentions": [{"id": "4", "username": "b"}],
            "reactions": [{"count": 2, "me": true, "emoji": {"id": null, "name": "👍"}}],
            "message_reference": {"message_id": "9"}
        }))
        .unwrap();
        let message = payload.to_message();

        assert_eq!(message.timestamp.timestamp_millis(), 1_462_015_105_796);
        assert_eq!(message.mention_ids, vec![Snowflake::new(4)]);
        assert_eq!(message.reference_id, Some(Snowflake::new(9)));
        assert_eq!(message.reactions[0].count, 2);
    }

    #[test]
    fn test_message_update_applies_only_present_fields() {
        let mut message = Message::new(Snowflake::new(1), Snowflake::new(2), Snowflake::new(3), "before");
        message.pinned = true;
        let update: MessageUpdatePayload = serde_json::from_value(json!({
            "id": "1",
            "channel_id": "2",
            "content": "after",
            "edited_timestamp": "2024-05-01T12:00:00.000000+00:00"
        }))
        .unwrap();

        update.apply(&mut message);
        assert_eq!(message.content, "after");
        assert!(message.pinned);
        assert!(message.edited_timestamp.is_some());
    }

    #[test]
    fn test_partial_user_apply() {
        let user = User::new(Snowflake::new(1), "name");
        let unchanged = PartialUserPayload {
            id: user.id,
            username: None,
            discriminator: None,
            global_name: None,
            avatar: None,
        };
        assert!(unchanged.apply_to(&user).is_none());

        let renamed = PartialUserPayload {
            username: Some("renamed".to_string()),
            ..unchanged
        };
        assert_eq!(renamed.apply_to(&user).unwrap().username, "renamed");
    }

    #[test]
    fn test_thread_requires_parent() {
        let payload: ChannelPayload =
            serde_json::from_value(json!({"id": "1", "type": 11, "guild_id": "2"})).unwrap();
        assert!(payload.is_thread());
        assert!(payload.to_thread(None).is_none());
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-01-01T00:00:00Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
