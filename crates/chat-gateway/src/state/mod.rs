//! Connection state
//!
//! Applies decoded gateway events to the entity cache and turns them into
//! public [`Event`]s. All mutation happens on the task that calls
//! [`ConnectionState::dispatch`]; readers take a short read lock and clone.

mod channels;
mod event;
mod guilds;
mod members;
mod messages;
mod ready;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chat_cache::{CacheSettings, ChunkError, ChunkRegistry, ChunkWaiter, EntityCache};
use chat_common::ClientConfig;
use chat_core::{
    Channel, Emoji, Guild, Intents, Member, Message, Snowflake, Sticker, User, VoiceState,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::events::GatewayEvent;
use crate::protocol::RequestGuildMembersPayload;
use crate::sender::GatewaySender;

pub use event::Event;
use ready::Readiness;

/// Behaviour switches for the connection state
#[derive(Debug, Clone)]
pub struct StateSettings {
    pub intents: Intents,
    pub shard_count: u32,
    /// Request the member list of guilds that do not ship it in full
    pub chunk_at_startup: bool,
    /// How long a shard waits for further guilds before it is ready
    pub guild_ready_timeout: Duration,
    pub chunk_timeout: Duration,
    pub cache: CacheSettings,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            intents: Intents::default(),
            shard_count: 1,
            chunk_at_startup: true,
            guild_ready_timeout: Duration::from_secs(2),
            chunk_timeout: Duration::from_secs(60),
            cache: CacheSettings::default(),
        }
    }
}

impl From<&ClientConfig> for StateSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            intents: config.gateway.intents,
            shard_count: config.gateway.shard_count.max(1),
            chunk_at_startup: config.cache.chunk_at_startup,
            guild_ready_timeout: config.gateway.guild_ready_timeout(),
            chunk_timeout: config.gateway.chunk_timeout(),
            cache: CacheSettings::from(config),
        }
    }
}

/// Authentication state that survives a READY
#[derive(Debug, Default)]
struct Session {
    user: Option<User>,
    application_id: Option<Snowflake>,
    session_ids: HashMap<u32, String>,
}

/// Cache of everything the gateway has told the client
pub struct ConnectionState {
    settings: StateSettings,
    cache: RwLock<EntityCache>,
    chunks: ChunkRegistry,
    sender: Arc<dyn GatewaySender>,
    events: mpsc::UnboundedSender<Event>,
    session: RwLock<Session>,
    readiness: Mutex<Readiness>,
}

impl ConnectionState {
    /// Create the state and the receiving end of its public events
    pub fn new(
        settings: StateSettings,
        sender: Arc<dyn GatewaySender>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let state = Arc::new(Self {
            cache: RwLock::new(EntityCache::new(settings.cache)),
            settings,
            chunks: ChunkRegistry::new(),
            sender,
            events,
            session: RwLock::new(Session::default()),
            readiness: Mutex::new(Readiness::default()),
        });
        (state, rx)
    }

    pub fn settings(&self) -> &StateSettings {
        &self.settings
    }

    /// Apply one dispatch event received on `shard_id`
    pub fn dispatch(self: &Arc<Self>, shard_id: u32, event: GatewayEvent) {
        trace!(shard_id, event = event.name(), "Dispatching gateway event");

        match event {
            GatewayEvent::Ready(payload) => self.handle_ready(shard_id, *payload),
            GatewayEvent::Resumed => {
                info!(shard_id, "Session resumed");
                self.emit(Event::Resumed(shard_id));
            }

            GatewayEvent::GuildCreate(payload) => self.handle_guild_create(shard_id, *payload),
            GatewayEvent::GuildUnavailable(payload) => self.handle_guild_outage(payload.id),
            GatewayEvent::GuildUpdate(payload) => self.handle_guild_update(*payload),
            GatewayEvent::GuildDelete(payload) => self.handle_guild_delete(payload),
            GatewayEvent::GuildEmojisUpdate(payload) => self.handle_emojis_update(payload),
            GatewayEvent::GuildStickersUpdate(payload) => self.handle_stickers_update(payload),
            GatewayEvent::GuildRoleCreate(payload) => self.handle_role_create(payload),
            GatewayEvent::GuildRoleUpdate(payload) => self.handle_role_update(payload),
            GatewayEvent::GuildRoleDelete(payload) => self.handle_role_delete(payload),
            GatewayEvent::ScheduledEventCreate(payload) => self.handle_scheduled_event_create(*payload),
            GatewayEvent::ScheduledEventUpdate(payload) => self.handle_scheduled_event_update(*payload),
            GatewayEvent::ScheduledEventDelete(payload) => self.handle_scheduled_event_delete(*payload),
            GatewayEvent::ScheduledEventUserAdd(payload) => self.handle_scheduled_event_user(payload, true),
            GatewayEvent::ScheduledEventUserRemove(payload) => self.handle_scheduled_event_user(payload, false),

            GatewayEvent::GuildMemberAdd(payload) => self.handle_member_add(*payload),
            GatewayEvent::GuildMemberUpdate(payload) => self.handle_member_update(*payload),
            GatewayEvent::GuildMemberRemove(payload) => self.handle_member_remove(payload),
            GatewayEvent::GuildMembersChunk(payload) => self.handle_members_chunk(payload),
            GatewayEvent::PresenceUpdate(payload) => self.handle_presence_update(*payload),
            GatewayEvent::UserUpdate(payload) => self.handle_user_update(payload),
            GatewayEvent::VoiceStateUpdate(payload) => self.handle_voice_state_update(*payload),
            GatewayEvent::VoiceServerUpdate(payload) => self.emit(Event::VoiceServerUpdate(payload)),

            GatewayEvent::ChannelCreate(payload) => self.handle_channel_create(*payload),
            GatewayEvent::ChannelUpdate(payload) => self.handle_channel_update(*payload),
            GatewayEvent::ChannelDelete(payload) => self.handle_channel_delete(*payload),
            GatewayEvent::ChannelPinsUpdate(payload) => self.handle_pins_update(payload),
            GatewayEvent::ThreadCreate(payload) => self.handle_thread_create(*payload),
            GatewayEvent::ThreadUpdate(payload) => self.handle_thread_update(*payload),
            GatewayEvent::ThreadDelete(payload) => self.handle_thread_delete(payload),
            GatewayEvent::ThreadListSync(payload) => self.handle_thread_list_sync(payload),

            GatewayEvent::MessageCreate(payload) => self.handle_message_create(*payload),
            GatewayEvent::MessageUpdate(payload) => self.handle_message_update(*payload),
            GatewayEvent::MessageDelete(payload) => self.handle_message_delete(payload),
            GatewayEvent::MessageDeleteBulk(payload) => self.handle_message_delete_bulk(payload),
            GatewayEvent::ReactionAdd(payload) => self.handle_reaction_add(*payload),
            GatewayEvent::ReactionRemove(payload) => self.handle_reaction_remove(*payload),
            GatewayEvent::ReactionRemoveAll(payload) => self.handle_reaction_clear(payload),
            GatewayEvent::ReactionRemoveEmoji(payload) => self.handle_reaction_clear_emoji(payload),
            GatewayEvent::TypingStart(payload) => self.handle_typing(*payload),

            GatewayEvent::InteractionCreate(data) => self.emit(Event::InteractionCreate(data)),
            GatewayEvent::Unknown { name, .. } => {
                debug!(shard_id, event = %name, "Ignoring unknown gateway event");
            }
        }
    }

    /// Forget everything a shard's session produced.
    ///
    /// With a single shard this clears the whole cache; pending chunk
    /// requests are cancelled either way.
    pub fn invalidate(&self, shard_id: u32) {
        info!(shard_id, "Session invalidated, dropping cached state");
        self.session.write().session_ids.remove(&shard_id);

        if self.settings.shard_count <= 1 {
            self.readiness.lock().reset();
            self.cache.write().clear();
        } else {
            self.readiness.lock().drop_shard(shard_id);
            self.remove_shard_guilds(shard_id);
        }
        self.chunks.cancel_all();
        self.emit(Event::SessionInvalidated(shard_id));
    }

    fn remove_shard_guilds(&self, shard_id: u32) {
        let mut cache = self.cache.write();
        let ids: Vec<Snowflake> = cache
            .guilds()
            .filter(|g| g.shard_id(self.settings.shard_count) == shard_id)
            .map(|g| g.id)
            .collect();
        for id in &ids {
            cache.remove_guild(*id);
            cache.purge_guild_messages(*id);
        }
        debug!(shard_id, guilds = ids.len(), "Dropped guilds of shard");
    }

    // === Member chunking ===

    /// Shard responsible for a guild
    pub fn shard_for(&self, guild_id: Snowflake) -> u32 {
        let count = u64::from(self.settings.shard_count.max(1));
        ((guild_id.get() >> 22) % count) as u32
    }

    fn needs_chunking(&self, guild: &Guild) -> bool {
        let intents = self.settings.intents;
        self.settings.chunk_at_startup
            && intents.contains(Intents::GUILD_MEMBERS)
            && !guild.is_chunked()
            && !(intents.contains(Intents::GUILD_PRESENCES) && !guild.large)
    }

    fn chunk_payload(&self, guild_id: Snowflake, nonce: &str) -> RequestGuildMembersPayload {
        RequestGuildMembersPayload::all(guild_id, nonce)
            .with_presences(self.settings.intents.contains(Intents::GUILD_PRESENCES))
    }

    /// Register a chunk request and send op 8 in the background
    fn request_chunk(&self, shard_id: u32, guild_id: Snowflake) -> ChunkWaiter {
        let waiter = self.chunks.create(guild_id);
        let payload = self.chunk_payload(guild_id, waiter.nonce());
        let sender = Arc::clone(&self.sender);
        let chunks = self.chunks.clone();

        tokio::spawn(async move {
            if let Err(e) = sender.request_guild_members(shard_id, &payload).await {
                warn!(guild_id = %guild_id, error = %e, "Failed to request guild members");
                if let Some(nonce) = &payload.nonce {
                    chunks.cancel(nonce);
                }
            }
        });
        waiter
    }

    /// Fetch every member of a guild over the gateway.
    ///
    /// Members arriving in the chunks are cached as they come in.
    pub async fn chunk_guild(&self, guild_id: Snowflake) -> Result<Vec<Member>, ChunkError> {
        let shard_id = self.shard_for(guild_id);
        let waiter = self.chunks.create(guild_id);
        let payload = self.chunk_payload(guild_id, waiter.nonce());

        if let Err(e) = self.sender.request_guild_members(shard_id, &payload).await {
            warn!(guild_id = %guild_id, error = %e, "Failed to request guild members");
            self.chunks.cancel(waiter.nonce());
        }
        waiter.wait(self.settings.chunk_timeout).await
    }

    pub fn pending_chunk_requests(&self) -> usize {
        self.chunks.len()
    }

    // === Helpers ===

    fn emit(&self, event: Event) {
        trace!(event = event.name(), "Emitting event");
        if self.events.send(event).is_err() {
            trace!("Event receiver dropped");
        }
    }

    fn is_me(&self, user_id: Snowflake) -> bool {
        self.session
            .read()
            .user
            .as_ref()
            .is_some_and(|u| u.id == user_id)
    }

    /// Whether the member cache flags keep this member
    fn retains_member(&self, guild: &Guild, user_id: Snowflake) -> bool {
        if self.is_me(user_id) {
            return true;
        }
        let in_voice = guild
            .voice_state(user_id)
            .is_some_and(VoiceState::is_connected);
        self.settings.cache.member_cache_flags.retains(in_voice)
    }

    // === Accessors ===

    pub fn current_user(&self) -> Option<User> {
        self.session.read().user.clone()
    }

    pub fn application_id(&self) -> Option<Snowflake> {
        self.session.read().application_id
    }

    pub fn session_id(&self, shard_id: u32) -> Option<String> {
        self.session.read().session_ids.get(&shard_id).cloned()
    }

    /// Run `f` against the cache under a read lock
    pub fn with_cache<R>(&self, f: impl FnOnce(&EntityCache) -> R) -> R {
        f(&*self.cache.read())
    }

    pub fn guild(&self, id: Snowflake) -> Option<Guild> {
        self.cache.read().guild(id).cloned()
    }

    pub fn guilds(&self) -> Vec<Guild> {
        self.cache.read().guilds().cloned().collect()
    }

    pub fn user(&self, id: Snowflake) -> Option<User> {
        self.cache.read().user(id).cloned()
    }

    pub fn member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member> {
        self.cache.read().guild(guild_id)?.member(user_id).cloned()
    }

    pub fn channel(&self, id: Snowflake) -> Option<Channel> {
        self.cache.read().channel(id).cloned()
    }

    pub fn private_channel_by_user(&self, user_id: Snowflake) -> Option<Channel> {
        self.cache.read().private_channel_by_user(user_id).cloned()
    }

    pub fn message(&self, id: Snowflake) -> Option<Message> {
        self.cache.read().message(id).cloned()
    }

    pub fn emoji(&self, id: Snowflake) -> Option<Emoji> {
        self.cache.read().emoji(id).cloned()
    }

    pub fn sticker(&self, id: Snowflake) -> Option<Sticker> {
        self.cache.read().sticker(id).cloned()
    }
}

impl std::fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionState")
            .field("settings", &self.settings)
            .field("pending_chunks", &self.chunks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::protocol::GatewayMessage;
    use crate::sender::ChannelSender;
    use serde_json::{json, Value};

    pub struct Harness {
        pub state: Arc<ConnectionState>,
        pub events: mpsc::UnboundedReceiver<Event>,
        pub commands: mpsc::UnboundedReceiver<(u32, GatewayMessage)>,
    }

    impl Harness {
        pub fn new(settings: StateSettings) -> Self {
            let (sender, commands) = ChannelSender::new();
            let (state, events) = ConnectionState::new(settings, Arc::new(sender));
            Self { state, events, commands }
        }

        /// Settings without chunking and with a short ready window
        pub fn quick() -> Self {
            Self::new(StateSettings {
                chunk_at_startup: false,
                guild_ready_timeout: Duration::from_millis(20),
                ..StateSettings::default()
            })
        }

        pub fn send(&self, name: &str, data: Value) {
            let event = GatewayEvent::decode(name, data).unwrap();
            self.state.dispatch(0, event);
        }

        pub fn drain(&mut self) -> Vec<Event> {
            let mut out = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                out.push(event);
            }
            out
        }

        pub async fn next(&mut self) -> Event {
            tokio::time::timeout(Duration::from_secs(2), self.events.recv())
                .await
                .expect("timed out waiting for event")
                .expect("event channel closed")
        }

        /// READY as user 1 with the given unavailable guilds
        pub fn ready(&self, guilds: &[u64]) {
            let guilds: Vec<Value> = guilds
                .iter()
                .map(|id| json!({"id": id.to_string(), "unavailable": true}))
                .collect();
            self.send(
                "READY",
                json!({
                    "v": 10,
                    "user": {"id": "1", "username": "me", "bot": true},
                    "guilds": guilds,
                    "session_id": "session",
                    "application": {"id": "99"}
                }),
            );
        }
    }

    pub fn guild_json(id: u64, members: &[u64]) -> Value {
        let members: Vec<Value> = members
            .iter()
            .map(|m| json!({"user": {"id": m.to_string(), "username": format!("user{m}")}, "roles": []}))
            .collect();
        json!({
            "id": id.to_string(),
            "name": format!("guild {id}"),
            "owner_id": "1",
            "member_count": members.len(),
            "roles": [{"id": id.to_string(), "name": "@everyone", "permissions": "0"}],
            "channels": [
                {"id": (id * 10).to_string(), "type": 0, "name": "general"},
                {"id": (id * 10 + 1).to_string(), "type": 2, "name": "voice"}
            ],
            "members": members
        })
    }

    pub fn message_json(id: u64, channel: u64, guild: Option<u64>, author: u64) -> Value {
        let mut data = json!({
            "id": id.to_string(),
            "channel_id": channel.to_string(),
            "author": {"id": author.to_string(), "username": format!("user{author}")},
            "content": format!("message {id}"),
            "timestamp": "2024-01-01T00:00:00+00:00"
        });
        if let Some(guild) = guild {
            data["guild_id"] = json!(guild.to_string());
        }
        data
    }
}
