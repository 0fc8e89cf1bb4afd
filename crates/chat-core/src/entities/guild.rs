//! Guild entity - a server and everything the client caches inside it
//!
//! Child collections sit behind `Arc` so a guild can be cloned for an
//! `(old, new)` update pair without copying its members or channels. Writers
//! go through the `*_mut` accessors, which copy a collection only when a
//! snapshot still shares it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::value_objects::Snowflake;

use super::{Channel, Emoji, Member, Presence, Role, ScheduledEvent, Sticker, Thread, VoiceState};

type Shared<T> = Arc<HashMap<Snowflake, T>>;

/// Guild (server) entity
#[derive(Debug, Clone, Default)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub owner_id: Snowflake,
    /// Outage or not yet received after READY
    pub unavailable: bool,
    pub large: bool,
    pub member_count: u64,
    chunked: bool,
    channels: Shared<Channel>,
    threads: Shared<Thread>,
    roles: Shared<Role>,
    members: Shared<Member>,
    /// Keyed by user ID
    voice_states: Shared<VoiceState>,
    /// Keyed by user ID
    presences: Shared<Presence>,
    scheduled_events: Shared<ScheduledEvent>,
    pub emojis: Arc<Vec<Emoji>>,
    pub stickers: Arc<Vec<Sticker>>,
}

impl PartialEq for Guild {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.icon == other.icon
            && self.description == other.description
            && self.owner_id == other.owner_id
            && self.unavailable == other.unavailable
            && self.large == other.large
            && self.member_count == other.member_count
    }
}

impl Guild {
    /// Create a new available Guild
    pub fn new(id: Snowflake, name: impl Into<String>, owner_id: Snowflake) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id,
            ..Self::default()
        }
    }

    /// Placeholder for a guild listed in READY whose data has not arrived
    pub fn unavailable_stub(id: Snowflake) -> Self {
        Self {
            id,
            unavailable: true,
            ..Self::default()
        }
    }

    /// Check if a user is the guild owner
    #[inline]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == user_id
    }

    /// Shard that receives this guild's events
    pub fn shard_id(&self, shard_count: u32) -> u32 {
        if shard_count == 0 {
            return 0;
        }
        ((self.id.get() >> 22) % u64::from(shard_count)) as u32
    }

    /// Every member is cached, either by chunking or because the guild is small
    pub fn is_chunked(&self) -> bool {
        self.chunked || (self.member_count > 0 && self.members.len() as u64 >= self.member_count)
    }

    pub fn mark_chunked(&mut self) {
        self.chunked = true;
    }

    pub fn increment_member_count(&mut self) {
        self.member_count = self.member_count.saturating_add(1);
    }

    pub fn decrement_member_count(&mut self) {
        self.member_count = self.member_count.saturating_sub(1);
    }

    /// Copy the scalar fields of a fresh payload into this guild, keeping
    /// cached collections
    pub fn update_from(&mut self, other: &Guild) {
        self.name.clone_from(&other.name);
        self.icon.clone_from(&other.icon);
        self.description.clone_from(&other.description);
        self.owner_id = other.owner_id;
        self.large = other.large;
        if other.member_count > 0 {
            self.member_count = other.member_count;
        }
    }

    /// The @everyone role, which shares the guild ID
    pub fn default_role(&self) -> Option<&Role> {
        self.roles.get(&self.id)
    }

    // Channels

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn channel(&self, id: Snowflake) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub fn channels_mut(&mut self) -> &mut HashMap<Snowflake, Channel> {
        Arc::make_mut(&mut self.channels)
    }

    // Threads

    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    pub fn thread(&self, id: Snowflake) -> Option<&Thread> {
        self.threads.get(&id)
    }

    pub fn threads_mut(&mut self) -> &mut HashMap<Snowflake, Thread> {
        Arc::make_mut(&mut self.threads)
    }

    // Roles

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn role(&self, id: Snowflake) -> Option<&Role> {
        self.roles.get(&id)
    }

    pub fn roles_mut(&mut self) -> &mut HashMap<Snowflake, Role> {
        Arc::make_mut(&mut self.roles)
    }

    // Members

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn member(&self, user_id: Snowflake) -> Option<&Member> {
        self.members.get(&user_id)
    }

    pub fn member_ids(&self) -> impl Iterator<Item = Snowflake> + '_ {
        self.members.keys().copied()
    }

    pub fn cached_member_count(&self) -> usize {
        self.members.len()
    }

    pub fn members_mut(&mut self) -> &mut HashMap<Snowflake, Member> {
        Arc::make_mut(&mut self.members)
    }

    // Voice states

    pub fn voice_states(&self) -> impl Iterator<Item = &VoiceState> {
        self.voice_states.values()
    }

    pub fn voice_state(&self, user_id: Snowflake) -> Option<&VoiceState> {
        self.voice_states.get(&user_id)
    }

    pub fn voice_states_mut(&mut self) -> &mut HashMap<Snowflake, VoiceState> {
        Arc::make_mut(&mut self.voice_states)
    }

    // Presences

    pub fn presence(&self, user_id: Snowflake) -> Option<&Presence> {
        self.presences.get(&user_id)
    }

    pub fn presences_mut(&mut self) -> &mut HashMap<Snowflake, Presence> {
        Arc::make_mut(&mut self.presences)
    }

    // Scheduled events

    pub fn scheduled_events(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.scheduled_events.values()
    }

    pub fn scheduled_event(&self, id: Snowflake) -> Option<&ScheduledEvent> {
        self.scheduled_events.get(&id)
    }

    pub fn scheduled_events_mut(&mut self) -> &mut HashMap<Snowflake, ScheduledEvent> {
        Arc::make_mut(&mut self.scheduled_events)
    }

    /// Remove a channel, dropping scheduled events hosted in it when it is a
    /// voice or stage channel
    pub fn remove_channel(&mut self, id: Snowflake) -> Option<Channel> {
        let channel = self.channels_mut().remove(&id)?;
        if channel.kind.is_voice() {
            self.scheduled_events_mut()
                .retain(|_, event| event.channel_id != Some(id));
        }
        Some(channel)
    }

    /// Remove a role and strip it from every cached member
    pub fn remove_role(&mut self, id: Snowflake) -> Option<Role> {
        let role = self.roles_mut().remove(&id)?;
        if self.members.values().any(|m| m.has_role(id)) {
            for member in self.members_mut().values_mut() {
                member.remove_role(id);
            }
        }
        Some(role)
    }

    /// Remove threads that belong to `parent_id`
    pub fn remove_threads_of(&mut self, parent_id: Snowflake) -> Vec<Thread> {
        let ids: Vec<Snowflake> = self
            .threads
            .values()
            .filter(|t| t.parent_id == parent_id)
            .map(|t| t.id)
            .collect();
        if ids.is_empty() {
            return Vec::new();
        }
        let threads = self.threads_mut();
        ids.iter().filter_map(|id| threads.remove(id)).collect()
    }
}
