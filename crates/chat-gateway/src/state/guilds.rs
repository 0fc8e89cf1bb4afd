//! Guild, role, emoji, sticker and scheduled event handlers

use std::sync::Arc;

use chat_cache::ChunkWaiter;
use chat_core::{Guild, Snowflake};
use tracing::{debug, info, warn};

use super::ready::PendingGuild;
use super::{ConnectionState, Event};
use crate::events::payloads::{
    GuildDeletePayload, GuildEmojisUpdatePayload, GuildPayload, GuildRoleDeletePayload,
    GuildRolePayload, GuildStickersUpdatePayload, ScheduledEventPayload, ScheduledEventUserPayload,
};

impl ConnectionState {
    pub(super) fn handle_guild_create(self: &Arc<Self>, shard_id: u32, payload: GuildPayload) {
        if payload.unavailable {
            self.handle_guild_outage(payload.id);
            return;
        }

        let (mut guild, users) = payload.to_guild();
        let guild_id = guild.id;
        let needs_chunking = self.needs_chunking(&guild);

        let dropped: Vec<Snowflake> = guild
            .members()
            .filter(|m| !self.retains_member(&guild, m.user_id))
            .map(|m| m.user_id)
            .collect();
        if !dropped.is_empty() {
            let members = guild.members_mut();
            for user_id in &dropped {
                members.remove(user_id);
            }
        }

        let known = self.cache.write().store_guild(guild, users).is_some();
        let mut chunk = needs_chunking.then(|| self.request_chunk(shard_id, guild_id));
        debug!(guild_id = %guild_id, known, chunking = chunk.is_some(), "Guild received");

        if known {
            // A launching shard holds availability until it is ready
            let offered = self.readiness.lock().offer(shard_id, PendingGuild { guild_id, chunk });
            match offered {
                Ok(()) => return,
                Err(pending) => chunk = pending.chunk,
            }
        }

        let make: fn(Guild) -> Event = if known {
            Event::GuildAvailable
        } else {
            Event::GuildJoin
        };
        self.emit_guild_when_chunked(guild_id, chunk, make);
    }

    /// Emit a guild notification now, or once its member chunk settles
    fn emit_guild_when_chunked(
        self: &Arc<Self>,
        guild_id: Snowflake,
        chunk: Option<ChunkWaiter>,
        make: fn(Guild) -> Event,
    ) {
        let Some(waiter) = chunk else {
            if let Some(guild) = self.guild(guild_id) {
                self.emit(make(guild));
            }
            return;
        };

        let state = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = waiter.wait(state.settings.chunk_timeout).await {
                warn!(guild_id = %guild_id, received = e.partial().len(), error = %e, "Emitting guild before chunking finished");
            }
            if let Some(guild) = state.guild(guild_id) {
                state.emit(make(guild));
            }
        });
    }

    /// GUILD_CREATE for a guild in an outage
    pub(super) fn handle_guild_outage(&self, guild_id: Snowflake) {
        let mut cache = self.cache.write();
        match cache.guild_mut(guild_id) {
            Some(guild) => guild.unavailable = true,
            None => {
                cache.store_guild(Guild::unavailable_stub(guild_id), Vec::new());
            }
        }
        debug!(guild_id = %guild_id, "Guild unavailable");
    }

    pub(super) fn handle_guild_update(&self, payload: GuildPayload) {
        let (fresh, _) = payload.to_guild();
        let mut cache = self.cache.write();
        let Some(guild) = cache.guild_mut(payload.id) else {
            debug!(guild_id = %payload.id, "GUILD_UPDATE for unknown guild");
            return;
        };

        let old = guild.clone();
        guild.update_from(&fresh);
        if !payload.roles.is_empty() {
            let roles = guild.roles_mut();
            roles.clear();
            roles.extend(fresh.roles().map(|r| (r.id, r.clone())));
        }
        let new = guild.clone();
        drop(cache);

        self.emit(Event::GuildUpdate { old, new });
    }

    pub(super) fn handle_guild_delete(&self, payload: GuildDeletePayload) {
        if payload.unavailable == Some(true) {
            let outage = {
                let mut cache = self.cache.write();
                cache.guild_mut(payload.id).map(|guild| {
                    guild.unavailable = true;
                    guild.clone()
                })
            };
            match outage {
                Some(guild) => {
                    warn!(guild_id = %payload.id, "Guild became unavailable");
                    self.emit(Event::GuildUnavailable(guild));
                }
                None => debug!(guild_id = %payload.id, "Outage for unknown guild"),
            }
            return;
        }

        let removed = {
            let mut cache = self.cache.write();
            let removed = cache.remove_guild(payload.id);
            cache.purge_guild_messages(payload.id);
            removed
        };
        match removed {
            Some(guild) => {
                info!(guild_id = %payload.id, name = %guild.name, "Removed from guild");
                self.emit(Event::GuildRemove(guild));
            }
            None => debug!(guild_id = %payload.id, "GUILD_DELETE for unknown guild"),
        }
    }

    pub(super) fn handle_emojis_update(&self, payload: GuildEmojisUpdatePayload) {
        let guild_id = payload.guild_id;
        let emojis = payload.emojis.iter().map(|e| e.to_emoji(guild_id)).collect();
        let changed = self.cache.write().set_guild_emojis(guild_id, emojis);
        match changed {
            Some((old, new)) => self.emit(Event::EmojisUpdate { guild_id, old, new }),
            None => debug!(guild_id = %guild_id, "Emoji update for unknown guild"),
        }
    }

    pub(super) fn handle_stickers_update(&self, payload: GuildStickersUpdatePayload) {
        let guild_id = payload.guild_id;
        let stickers = payload.stickers.iter().map(|s| s.to_sticker(guild_id)).collect();
        let changed = self.cache.write().set_guild_stickers(guild_id, stickers);
        match changed {
            Some((old, new)) => self.emit(Event::StickersUpdate { guild_id, old, new }),
            None => debug!(guild_id = %guild_id, "Sticker update for unknown guild"),
        }
    }

    // Roles

    pub(super) fn handle_role_create(&self, payload: GuildRolePayload) {
        let role = payload.role.to_role(payload.guild_id);
        {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(payload.guild_id) else {
                debug!(guild_id = %payload.guild_id, "Role create for unknown guild");
                return;
            };
            guild.roles_mut().insert(role.id, role.clone());
        }
        self.emit(Event::RoleCreate(role));
    }

    pub(super) fn handle_role_update(&self, payload: GuildRolePayload) {
        let new = payload.role.to_role(payload.guild_id);
        let old = {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(payload.guild_id) else {
                return;
            };
            if guild.role(new.id).is_none() {
                debug!(role_id = %new.id, "Role update for unknown role");
                return;
            }
            guild.roles_mut().insert(new.id, new.clone())
        };
        if let Some(old) = old {
            self.emit(Event::RoleUpdate { old, new });
        }
    }

    pub(super) fn handle_role_delete(&self, payload: GuildRoleDeletePayload) {
        let removed = self
            .cache
            .write()
            .guild_mut(payload.guild_id)
            .and_then(|guild| guild.remove_role(payload.role_id));
        if let Some(role) = removed {
            self.emit(Event::RoleDelete(role));
        }
    }

    // Scheduled events

    pub(super) fn handle_scheduled_event_create(&self, payload: ScheduledEventPayload) {
        let event = payload.to_scheduled_event();
        {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(event.guild_id) else {
                debug!(guild_id = %event.guild_id, "Scheduled event for unknown guild");
                return;
            };
            guild.scheduled_events_mut().insert(event.id, event.clone());
        }
        self.emit(Event::ScheduledEventCreate(event));
    }

    pub(super) fn handle_scheduled_event_update(&self, payload: ScheduledEventPayload) {
        let new = payload.to_scheduled_event();
        let old = {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(new.guild_id) else {
                return;
            };
            if guild.scheduled_event(new.id).is_none() {
                debug!(event_id = %new.id, "Update for unknown scheduled event");
                return;
            }
            guild.scheduled_events_mut().insert(new.id, new.clone())
        };
        if let Some(old) = old {
            self.emit(Event::ScheduledEventUpdate { old, new });
        }
    }

    pub(super) fn handle_scheduled_event_delete(&self, payload: ScheduledEventPayload) {
        let removed = self
            .cache
            .write()
            .guild_mut(payload.guild_id)
            .and_then(|guild| guild.scheduled_events_mut().remove(&payload.id));
        match removed {
            Some(event) => self.emit(Event::ScheduledEventDelete(event)),
            None => debug!(event_id = %payload.id, "Delete for unknown scheduled event"),
        }
    }

    pub(super) fn handle_scheduled_event_user(&self, payload: ScheduledEventUserPayload, add: bool) {
        let event = {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(payload.guild_id) else {
                return;
            };
            let Some(event) = guild
                .scheduled_events_mut()
                .get_mut(&payload.guild_scheduled_event_id)
            else {
                debug!(event_id = %payload.guild_scheduled_event_id, "Subscriber change for unknown scheduled event");
                return;
            };
            if add {
                event.add_subscriber();
            } else {
                event.remove_subscriber();
            }
            event.clone()
        };

        let user_id = payload.user_id;
        if add {
            self.emit(Event::ScheduledEventUserAdd { event, user_id });
        } else {
            self.emit(Event::ScheduledEventUserRemove { event, user_id });
        }
    }
}
