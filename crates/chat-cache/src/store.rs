//! Entity cache
//!
//! Owns every cached entity and keeps the cross references consistent:
//! user reference counts follow memberships, DM recipients and message
//! authors; emoji and sticker indices follow their guilds. Mutation happens
//! from a single task; readers clone what they need.

use std::collections::HashMap;

use chat_common::ClientConfig;
use chat_core::{
    Channel, Emoji, Guild, Member, MemberCacheFlags, Message, Snowflake, Sticker, User,
};
use tracing::debug;

use crate::private::PrivateChannels;
use crate::ring::MessageRing;
use crate::users::UserStore;

/// Size limits and retention policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// `None` disables the message cache
    pub max_messages: Option<usize>,
    pub private_channel_capacity: usize,
    pub member_cache_flags: MemberCacheFlags,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_messages: Some(1000),
            private_channel_capacity: 128,
            member_cache_flags: MemberCacheFlags::default(),
        }
    }
}

impl From<&ClientConfig> for CacheSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_messages: config.cache.max_messages,
            private_channel_capacity: config.cache.private_channel_capacity,
            member_cache_flags: config.member_cache_flags(),
        }
    }
}

/// In-memory entity cache
#[derive(Debug, Clone)]
pub struct EntityCache {
    settings: CacheSettings,
    users: UserStore,
    guilds: HashMap<Snowflake, Guild>,
    private_channels: PrivateChannels,
    messages: Option<MessageRing>,
    emojis: HashMap<Snowflake, Emoji>,
    stickers: HashMap<Snowflake, Sticker>,
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

impl EntityCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            users: UserStore::new(),
            guilds: HashMap::new(),
            private_channels: PrivateChannels::new(settings.private_channel_capacity),
            messages: settings.max_messages.map(MessageRing::new),
            emojis: HashMap::new(),
            stickers: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn member_cache_flags(&self) -> MemberCacheFlags {
        self.settings.member_cache_flags
    }

    /// Drop everything, as on a fresh READY
    pub fn clear(&mut self) {
        self.users.clear();
        self.guilds.clear();
        self.private_channels.clear();
        if let Some(ring) = &mut self.messages {
            ring.drain();
        }
        self.emojis.clear();
        self.stickers.clear();
        debug!("Entity cache cleared");
    }

    // Users

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    pub fn user(&self, id: Snowflake) -> Option<&User> {
        self.users.get(id)
    }

    /// Replace a cached user's data in place; uncached users are dropped
    pub fn update_user(&mut self, user: User) -> Option<(User, User)> {
        self.users.update(user)
    }

    // Guilds

    pub fn guild(&self, id: Snowflake) -> Option<&Guild> {
        self.guilds.get(&id)
    }

    pub fn guild_mut(&mut self, id: Snowflake) -> Option<&mut Guild> {
        self.guilds.get_mut(&id)
    }

    pub fn guilds(&self) -> impl Iterator<Item = &Guild> {
        self.guilds.values()
    }

    pub fn guild_count(&self) -> usize {
        self.guilds.len()
    }

    /// Store a guild along with the users behind its cached members.
    ///
    /// A replaced guild gives up its member references and index entries
    /// first. Users without a cached membership are not retained.
    pub fn store_guild(&mut self, guild: Guild, users: Vec<User>) -> Option<Guild> {
        let replaced = self.detach_guild(guild.id);

        for user in users {
            if guild.member(user.id).is_some() {
                self.users.acquire(user);
            }
        }
        for emoji in guild.emojis.iter() {
            self.emojis.insert(emoji.id, emoji.clone());
        }
        for sticker in guild.stickers.iter() {
            self.stickers.insert(sticker.id, sticker.clone());
        }
        self.guilds.insert(guild.id, guild);
        replaced
    }

    /// Remove a guild, releasing its member references and index entries
    pub fn remove_guild(&mut self, id: Snowflake) -> Option<Guild> {
        self.detach_guild(id)
    }

    fn detach_guild(&mut self, id: Snowflake) -> Option<Guild> {
        let guild = self.guilds.remove(&id)?;
        for user_id in guild.member_ids() {
            self.users.release(user_id);
        }
        for emoji in guild.emojis.iter() {
            self.emojis.remove(&emoji.id);
        }
        for sticker in guild.stickers.iter() {
            self.stickers.remove(&sticker.id);
        }
        Some(guild)
    }

    // Members

    /// Insert or update a member. New memberships take a user reference;
    /// existing ones only refresh the user data.
    ///
    /// Returns the previous member, or `None` if the guild is unknown or the
    /// member is new.
    pub fn upsert_member(&mut self, member: Member, user: User) -> Option<Member> {
        let guild = self.guilds.get_mut(&member.guild_id)?;
        let previous = guild.members_mut().insert(member.user_id, member);
        if previous.is_some() {
            self.users.update(user);
        } else {
            self.users.acquire(user);
        }
        previous
    }

    pub fn remove_member(&mut self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member> {
        let guild = self.guilds.get_mut(&guild_id)?;
        let member = guild.members_mut().remove(&user_id)?;
        self.users.release(user_id);
        Some(member)
    }

    /// Drop members for which `retain` returns false
    pub fn trim_members<F>(&mut self, guild_id: Snowflake, mut retain: F) -> usize
    where
        F: FnMut(&Guild, &Member) -> bool,
    {
        let Some(guild) = self.guilds.get(&guild_id) else {
            return 0;
        };
        let dropped: Vec<Snowflake> = guild
            .members()
            .filter(|member| !retain(guild, member))
            .map(|member| member.user_id)
            .collect();
        for user_id in &dropped {
            self.remove_member(guild_id, *user_id);
        }
        dropped.len()
    }

    // Private channels

    pub fn private_channels(&self) -> &PrivateChannels {
        &self.private_channels
    }

    pub fn private_channel(&self, id: Snowflake) -> Option<&Channel> {
        self.private_channels.get(id)
    }

    pub fn private_channel_by_user(&self, user_id: Snowflake) -> Option<&Channel> {
        self.private_channels.by_user(user_id)
    }

    /// Store a DM channel with its recipients.
    ///
    /// Recipient references move from the replaced channel to the new one;
    /// an evicted channel releases its recipients.
    pub fn store_private_channel(&mut self, channel: Channel, recipients: Vec<User>) -> Option<Channel> {
        for user in recipients {
            if channel.recipient_ids.contains(&user.id) {
                self.users.acquire(user);
            }
        }
        let (replaced, evicted) = self.private_channels.insert(channel);
        for old in replaced.iter().chain(evicted.iter()) {
            for user_id in &old.recipient_ids {
                self.users.release(*user_id);
            }
        }
        if let Some(evicted) = &evicted {
            debug!(channel_id = %evicted.id, "Evicted private channel");
        }
        replaced
    }

    /// Merge an update into a cached DM channel.
    ///
    /// Recipients that joined take a user reference and recipients that left
    /// release theirs; the recipient index follows the merged channel. An
    /// update without recipients keeps the cached ones. Returns `(old, new)`.
    pub fn merge_private_channel(
        &mut self,
        mut channel: Channel,
        recipients: Vec<User>,
    ) -> Option<(Channel, Channel)> {
        let old = self.private_channels.get(channel.id)?.clone();
        if channel.recipient_ids.is_empty() {
            channel.recipient_ids.clone_from(&old.recipient_ids);
        }

        for user in recipients {
            if channel.recipient_ids.contains(&user.id) && !old.recipient_ids.contains(&user.id) {
                self.users.acquire(user);
            } else if old.recipient_ids.contains(&user.id) {
                self.users.update(user);
            }
        }
        for user_id in &old.recipient_ids {
            if !channel.recipient_ids.contains(user_id) {
                self.users.release(*user_id);
            }
        }

        let mut merged = old.clone();
        merged.merge(channel);
        self.private_channels.replace(merged.clone());
        Some((old, merged))
    }

    pub fn touch_private_channel(&mut self, id: Snowflake) -> bool {
        self.private_channels.touch(id)
    }

    pub fn private_channel_mut(&mut self, id: Snowflake) -> Option<&mut Channel> {
        self.private_channels.get_mut(id)
    }

    pub fn remove_private_channel(&mut self, id: Snowflake) -> Option<Channel> {
        let channel = self.private_channels.remove(id)?;
        for user_id in &channel.recipient_ids {
            self.users.release(*user_id);
        }
        Some(channel)
    }

    /// Look up a channel in any guild or among private channels
    pub fn channel(&self, id: Snowflake) -> Option<&Channel> {
        self.private_channels
            .get(id)
            .or_else(|| self.guilds.values().find_map(|g| g.channel(id)))
    }

    /// Guild that owns a channel or thread
    pub fn guild_of_channel(&self, channel_id: Snowflake) -> Option<Snowflake> {
        self.guilds
            .values()
            .find(|g| g.channel(channel_id).is_some() || g.thread(channel_id).is_some())
            .map(|g| g.id)
    }

    // Messages

    pub fn messages_enabled(&self) -> bool {
        self.messages.is_some()
    }

    pub fn message(&self, id: Snowflake) -> Option<&Message> {
        self.messages.as_ref()?.find(id)
    }

    pub fn message_mut(&mut self, id: Snowflake) -> Option<&mut Message> {
        self.messages.as_mut()?.find_mut(id)
    }

    /// Oldest to newest
    pub fn messages(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.messages.iter().flat_map(|ring| ring.iter())
    }

    pub fn message_count(&self) -> usize {
        self.messages.as_ref().map_or(0, MessageRing::len)
    }

    /// Cache a message and take a reference on its author.
    ///
    /// Returns false when the message cache is disabled.
    pub fn store_message(&mut self, message: Message, author: User) -> bool {
        let Some(ring) = &mut self.messages else {
            return false;
        };
        self.users.acquire(author);
        if let Some(evicted) = ring.push(message) {
            self.users.release(evicted.author_id);
        }
        true
    }

    pub fn remove_message(&mut self, id: Snowflake) -> Option<Message> {
        let message = self.messages.as_mut()?.remove(id)?;
        self.users.release(message.author_id);
        Some(message)
    }

    /// Drop cached messages of a guild the client left
    pub fn purge_guild_messages(&mut self, guild_id: Snowflake) -> usize {
        let Some(ring) = &mut self.messages else {
            return 0;
        };
        let removed = ring.remove_where(|m| m.guild_id == Some(guild_id));
        for message in &removed {
            self.users.release(message.author_id);
        }
        removed.len()
    }

    /// Drop cached messages of a deleted channel
    pub fn purge_channel_messages(&mut self, channel_id: Snowflake) -> usize {
        let Some(ring) = &mut self.messages else {
            return 0;
        };
        let removed = ring.remove_where(|m| m.channel_id == channel_id);
        for message in &removed {
            self.users.release(message.author_id);
        }
        removed.len()
    }

    // Emojis and stickers

    pub fn emoji(&self, id: Snowflake) -> Option<&Emoji> {
        self.emojis.get(&id)
    }

    pub fn emoji_count(&self) -> usize {
        self.emojis.len()
    }

    pub fn sticker(&self, id: Snowflake) -> Option<&Sticker> {
        self.stickers.get(&id)
    }

    pub fn sticker_count(&self) -> usize {
        self.stickers.len()
    }

    /// Replace a guild's emojis, keeping the index in step.
    ///
    /// Returns `(old, new)`, or `None` for an unknown guild.
    pub fn set_guild_emojis(
        &mut self,
        guild_id: Snowflake,
        emojis: Vec<Emoji>,
    ) -> Option<(Vec<Emoji>, Vec<Emoji>)> {
        let guild = self.guilds.get_mut(&guild_id)?;
        let old = std::mem::replace(&mut guild.emojis, emojis.clone().into());
        for emoji in old.iter() {
            self.emojis.remove(&emoji.id);
        }
        for emoji in &emojis {
            self.emojis.insert(emoji.id, emoji.clone());
        }
        Some((old.to_vec(), emojis))
    }

    /// Replace a guild's stickers, keeping the index in step
    pub fn set_guild_stickers(
        &mut self,
        guild_id: Snowflake,
        stickers: Vec<Sticker>,
    ) -> Option<(Vec<Sticker>, Vec<Sticker>)> {
        let guild = self.guilds.get_mut(&guild_id)?;
        let old = std::mem::replace(&mut guild.stickers, stickers.clone().into());
        for sticker in old.iter() {
            self.stickers.remove(&sticker.id);
        }
        for sticker in &stickers {
            self.stickers.insert(sticker.id, sticker.clone());
        }
        Some((old.to_vec(), stickers))
    }
}
