//! Member, presence, user and voice state handlers

use chat_core::MemberCacheFlags;
use tracing::debug;

use super::{ConnectionState, Event};
use crate::events::payloads::{
    GuildMemberPayload, GuildMemberRemovePayload, GuildMembersChunkPayload, PresencePayload,
    UserPayload, VoiceStatePayload,
};

impl ConnectionState {
    pub(super) fn handle_member_add(&self, payload: GuildMemberPayload) {
        let guild_id = payload.guild_id;
        let Some((member, user)) = payload.member.to_member_and_user(guild_id) else {
            debug!(guild_id = %guild_id, "GUILD_MEMBER_ADD without user");
            return;
        };
        let retain = self.is_me(member.user_id) || self.settings.cache.member_cache_flags.retains(false);

        {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(guild_id) else {
                debug!(guild_id = %guild_id, "Member joined unknown guild");
                return;
            };
            guild.increment_member_count();
            if retain {
                cache.upsert_member(member.clone(), user);
            }
        }
        self.emit(Event::MemberJoin(member));
    }

    pub(super) fn handle_member_update(&self, payload: GuildMemberPayload) {
        let guild_id = payload.guild_id;
        let Some((member, user)) = payload.member.to_member_and_user(guild_id) else {
            return;
        };
        let user_id = member.user_id;

        let mut cache = self.cache.write();
        let Some(guild) = cache.guild(guild_id) else {
            debug!(guild_id = %guild_id, "Member update for unknown guild");
            return;
        };

        let cached = guild.member(user_id).cloned();
        match cached {
            Some(old) => {
                let old_user = cache.user(user_id).cloned();
                cache.upsert_member(member.clone(), user.clone());
                drop(cache);

                self.emit(Event::MemberUpdate { old, new: member });
                if let Some(old_user) = old_user.filter(|u| u.differs_from(&user)) {
                    self.emit(Event::UserUpdate { old: old_user, new: user });
                }
            }
            None => {
                if self.settings.cache.member_cache_flags.contains(MemberCacheFlags::JOINED) {
                    cache.upsert_member(member, user);
                }
            }
        }
    }

    pub(super) fn handle_member_remove(&self, payload: GuildMemberRemovePayload) {
        let guild_id = payload.guild_id;
        let user = payload.user.to_user();

        let removed = {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(guild_id) else {
                debug!(guild_id = %guild_id, "Member left unknown guild");
                return;
            };
            guild.decrement_member_count();
            cache.remove_member(guild_id, user.id)
        };

        if let Some(member) = removed {
            self.emit(Event::MemberRemove(member));
        }
        self.emit(Event::RawMemberRemove { guild_id, user });
    }

    pub(super) fn handle_members_chunk(&self, payload: GuildMembersChunkPayload) {
        let guild_id = payload.guild_id;
        let mut cache = self.cache.write();
        if cache.guild(guild_id).is_none() {
            debug!(guild_id = %guild_id, "Member chunk for unknown guild");
        }

        let mut members = Vec::with_capacity(payload.members.len());
        for (member, user) in payload
            .members
            .iter()
            .filter_map(|m| m.to_member_and_user(guild_id))
        {
            let keep = cache
                .guild(guild_id)
                .is_some_and(|g| self.retains_member(g, member.user_id));
            if keep {
                cache.upsert_member(member.clone(), user);
            }
            members.push(member);
        }

        if let Some(guild) = cache.guild_mut(guild_id) {
            let presences = guild.presences_mut();
            for presence in &payload.presences {
                presences.insert(presence.user.id, presence.to_presence(guild_id));
            }
        }

        debug!(
            guild_id = %guild_id,
            index = payload.chunk_index,
            count = payload.chunk_count,
            members = members.len(),
            "Received member chunk"
        );

        // Waiters wake up once the cache lock is released, with the guild
        // already marked as chunked
        let Some(nonce) = &payload.nonce else {
            return;
        };
        if let Some(done) = self.chunks.on_chunk(nonce, members, payload.is_last()) {
            if let Some(guild) = cache.guild_mut(done.guild_id) {
                guild.mark_chunked();
            }
            debug!(guild_id = %done.guild_id, members = done.members.len(), "Guild chunked");
        }
    }

    pub(super) fn handle_presence_update(&self, payload: PresencePayload) {
        let Some(guild_id) = payload.guild_id else {
            debug!(user_id = %payload.user.id, "Presence update without guild");
            return;
        };
        let user_id = payload.user.id;
        let presence = payload.to_presence(guild_id);

        let (old, user_change) = {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(guild_id) else {
                debug!(guild_id = %guild_id, "Presence update for unknown guild");
                return;
            };
            let old = guild.presences_mut().insert(user_id, presence.clone());

            let user_change = cache.user(user_id).and_then(|cached| {
                payload
                    .user
                    .apply_to(cached)
                    .map(|updated| (cached.clone(), updated))
            });
            if let Some((_, updated)) = &user_change {
                cache.update_user(updated.clone());
            }
            (old, user_change)
        };

        self.emit(Event::PresenceUpdate { old, new: presence });
        if let Some((old, new)) = user_change {
            self.emit(Event::UserUpdate { old, new });
        }
    }

    /// USER_UPDATE is only sent for the current user
    pub(super) fn handle_user_update(&self, payload: UserPayload) {
        let user = payload.to_user();
        let previous = self.session.write().user.replace(user.clone());
        let cached = self.cache.write().update_user(user.clone());

        match cached.map(|(old, _)| old).or(previous) {
            Some(old) => self.emit(Event::UserUpdate { old, new: user }),
            None => debug!(user_id = %user.id, "USER_UPDATE before READY"),
        }
    }

    pub(super) fn handle_voice_state_update(&self, payload: VoiceStatePayload) {
        let user_id = payload.user_id;
        let after = payload.to_voice_state(payload.guild_id);
        let Some(guild_id) = payload.guild_id else {
            self.emit(Event::VoiceStateUpdate {
                guild_id: None,
                user_id,
                before: None,
                after,
            });
            return;
        };

        let flags = self.settings.cache.member_cache_flags;
        let is_me = self.is_me(user_id);
        let before = {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(guild_id) else {
                debug!(guild_id = %guild_id, "Voice state for unknown guild");
                return;
            };
            let before = if after.is_connected() {
                guild.voice_states_mut().insert(user_id, after.clone())
            } else {
                guild.voice_states_mut().remove(&user_id)
            };

            if after.is_connected() {
                let joined = payload
                    .member
                    .as_ref()
                    .and_then(|m| m.to_member_and_user(guild_id));
                if let Some((member, user)) = joined.filter(|_| flags.contains(MemberCacheFlags::VOICE)) {
                    cache.upsert_member(member, user);
                }
            } else if !is_me && !flags.retains(false) {
                cache.remove_member(guild_id, user_id);
            }
            before
        };

        self.emit(Event::VoiceStateUpdate {
            guild_id: Some(guild_id),
            user_id,
            before,
            after,
        });
    }
}
