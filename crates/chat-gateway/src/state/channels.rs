//! Channel and thread handlers

use std::collections::hash_map::Entry;

use chat_core::{ScheduledEvent, Thread};
use tracing::debug;

use super::{ConnectionState, Event};
use crate::events::parse_timestamp;
use crate::events::payloads::{
    ChannelPayload, ChannelPinsUpdatePayload, ThreadDeletePayload, ThreadListSyncPayload,
};

impl ConnectionState {
    pub(super) fn handle_channel_create(&self, payload: ChannelPayload) {
        let channel = payload.to_channel(None);

        if channel.is_private() {
            let mut cache = self.cache.write();
            if cache.private_channel(channel.id).is_some() {
                debug!(channel_id = %channel.id, "Duplicate channel create merged");
                cache.merge_private_channel(channel, payload.recipients());
                return;
            }
            cache.store_private_channel(channel.clone(), payload.recipients());
            drop(cache);
            self.emit(Event::ChannelCreate(channel));
            return;
        }

        let Some(guild_id) = channel.guild_id else {
            debug!(channel_id = %channel.id, "Guild channel without guild");
            return;
        };
        {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(guild_id) else {
                debug!(guild_id = %guild_id, "Channel created in unknown guild");
                return;
            };
            match guild.channels_mut().entry(channel.id) {
                Entry::Occupied(mut existing) => {
                    debug!(channel_id = %channel.id, "Duplicate channel create merged");
                    existing.get_mut().merge(channel);
                    return;
                }
                Entry::Vacant(slot) => {
                    slot.insert(channel.clone());
                }
            }
        }
        self.emit(Event::ChannelCreate(channel));
    }

    pub(super) fn handle_channel_update(&self, payload: ChannelPayload) {
        let channel = payload.to_channel(None);
        let id = channel.id;

        let changed = if channel.is_private() {
            self.cache
                .write()
                .merge_private_channel(channel, payload.recipients())
        } else {
            let mut cache = self.cache.write();
            let slot = match channel.guild_id {
                Some(guild_id) => cache
                    .guild_mut(guild_id)
                    .filter(|guild| guild.channel(id).is_some())
                    .and_then(|guild| guild.channels_mut().get_mut(&id)),
                None => None,
            };
            slot.map(|existing| {
                let old = existing.clone();
                existing.merge(channel);
                (old, existing.clone())
            })
        };

        match changed {
            Some((old, new)) => self.emit(Event::ChannelUpdate { old, new }),
            None => debug!(channel_id = %id, "Update for unknown channel"),
        }
    }

    pub(super) fn handle_channel_delete(&self, payload: ChannelPayload) {
        let id = payload.id;

        if payload.channel_type().is_private() {
            let removed = {
                let mut cache = self.cache.write();
                cache.purge_channel_messages(id);
                cache.remove_private_channel(id)
            };
            if let Some(channel) = removed {
                self.emit(Event::ChannelDelete(channel));
            }
            return;
        }

        let Some(guild_id) = payload.guild_id else {
            return;
        };
        let (removed, cancelled) = {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(guild_id) else {
                debug!(guild_id = %guild_id, "Channel deleted in unknown guild");
                return;
            };
            let hosted: Vec<ScheduledEvent> = guild
                .scheduled_events()
                .filter(|e| e.channel_id == Some(id))
                .cloned()
                .collect();
            let removed = guild.remove_channel(id);
            let cancelled = match &removed {
                Some(channel) if channel.kind.is_voice() => hosted,
                _ => Vec::new(),
            };
            cache.purge_channel_messages(id);
            (removed, cancelled)
        };

        for event in cancelled {
            self.emit(Event::ScheduledEventDelete(event));
        }
        match removed {
            Some(channel) => self.emit(Event::ChannelDelete(channel)),
            None => debug!(channel_id = %id, "Delete for unknown channel"),
        }
    }

    pub(super) fn handle_pins_update(&self, payload: ChannelPinsUpdatePayload) {
        let known = {
            let cache = self.cache.read();
            cache.channel(payload.channel_id).is_some()
                || cache.guild_of_channel(payload.channel_id).is_some()
        };
        if !known {
            debug!(channel_id = %payload.channel_id, "Pins update for unknown channel");
            return;
        }
        self.emit(Event::ChannelPinsUpdate {
            channel_id: payload.channel_id,
            guild_id: payload.guild_id,
            last_pin: payload.last_pin_timestamp.as_deref().and_then(parse_timestamp),
        });
    }

    // Threads

    pub(super) fn handle_thread_create(&self, payload: ChannelPayload) {
        let Some(thread) = payload.to_thread(None) else {
            debug!(channel_id = %payload.id, "Thread without guild or parent");
            return;
        };
        let is_new = {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(thread.guild_id) else {
                return;
            };
            guild.threads_mut().insert(thread.id, thread.clone()).is_none()
        };
        if is_new {
            self.emit(Event::ThreadCreate(thread));
        }
    }

    pub(super) fn handle_thread_update(&self, payload: ChannelPayload) {
        let Some(new) = payload.to_thread(None) else {
            return;
        };
        let old = {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(new.guild_id) else {
                return;
            };
            guild.threads_mut().insert(new.id, new.clone())
        };
        match old {
            Some(old) => self.emit(Event::ThreadUpdate { old, new }),
            None => self.emit(Event::ThreadCreate(new)),
        }
    }

    pub(super) fn handle_thread_delete(&self, payload: ThreadDeletePayload) {
        let removed = {
            let mut cache = self.cache.write();
            let removed = cache
                .guild_mut(payload.guild_id)
                .and_then(|guild| guild.threads_mut().remove(&payload.id));
            cache.purge_channel_messages(payload.id);
            removed
        };
        if let Some(thread) = removed {
            self.emit(Event::ThreadDelete(thread));
        }
        self.emit(Event::RawThreadDelete(payload));
    }

    /// Replace the active threads of the synced parents, or of the whole
    /// guild when no parents are named
    pub(super) fn handle_thread_list_sync(&self, payload: ThreadListSyncPayload) {
        let guild_id = payload.guild_id;
        let threads: Vec<Thread> = payload
            .threads
            .iter()
            .filter_map(|t| t.to_thread(Some(guild_id)))
            .collect();

        let (deleted, created) = {
            let mut cache = self.cache.write();
            let Some(guild) = cache.guild_mut(guild_id) else {
                debug!(guild_id = %guild_id, "Thread sync for unknown guild");
                return;
            };

            let previous: Vec<Thread> = match &payload.channel_ids {
                Some(parents) => parents
                    .iter()
                    .flat_map(|parent| guild.remove_threads_of(*parent))
                    .collect(),
                None => guild.threads_mut().drain().map(|(_, t)| t).collect(),
            };

            let map = guild.threads_mut();
            let mut created = Vec::new();
            for thread in threads {
                let existed = previous.iter().any(|p| p.id == thread.id);
                if map.insert(thread.id, thread.clone()).is_none() && !existed {
                    created.push(thread);
                }
            }
            let deleted: Vec<Thread> = previous
                .into_iter()
                .filter(|p| !map.contains_key(&p.id))
                .collect();

            for thread in &deleted {
                cache.purge_channel_messages(thread.id);
            }
            (deleted, created)
        };

        debug!(guild_id = %guild_id, deleted = deleted.len(), created = created.len(), "Thread list synced");
        for thread in deleted {
            self.emit(Event::ThreadDelete(thread));
        }
        for thread in created {
            self.emit(Event::ThreadCreate(thread));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{guild_json, message_json, Harness};
    use super::*;
    use chat_core::Snowflake;
    use serde_json::json;

    async fn joined() -> Harness {
        let mut h = Harness::quick();
        h.ready(&[]);
        h.send("GUILD_CREATE", guild_json(100, &[1, 2]));
        while !matches!(h.next().await, Event::Ready) {}
        h.drain();
        h
    }

    fn thread_json(id: u64, parent: u64, name: &str) -> serde_json::Value {
        json!({"id": id.to_string(), "type": 11, "guild_id": "100", "parent_id": parent.to_string(), "name": name})
    }

    #[tokio::test]
    async fn test_duplicate_channel_create_merges() {
        let mut h = joined().await;
        let channel = json!({"id": "2000", "type": 0, "guild_id": "100", "name": "news", "last_message_id": "50"});
        h.send("CHANNEL_CREATE", channel);
        h.send(
            "CHANNEL_CREATE",
            json!({"id": "2000", "type": 0, "guild_id": "100", "name": "news-2", "last_message_id": "40"}),
        );

        assert!(matches!(h.drain().as_slice(), [Event::ChannelCreate(_)]));
        let channel = h.state.channel(Snowflake::new(2000)).unwrap();
        assert_eq!(channel.name.as_deref(), Some("news-2"));
        assert_eq!(channel.last_message_id, Some(Snowflake::new(50)));
    }

    #[tokio::test]
    async fn test_voice_channel_delete_drops_scheduled_events() {
        let mut h = joined().await;
        h.send(
            "GUILD_SCHEDULED_EVENT_CREATE",
            json!({"id": "70", "guild_id": "100", "channel_id": "1001", "name": "standup", "entity_type": 2}),
        );
        h.send("MESSAGE_CREATE", message_json(9, 1001, Some(100), 2));
        h.drain();

        h.send("CHANNEL_DELETE", json!({"id": "1001", "type": 2, "guild_id": "100"}));
        let events = h.drain();
        assert!(matches!(&events[0], Event::ScheduledEventDelete(e) if e.id == Snowflake::new(70)));
        assert!(matches!(&events[1], Event::ChannelDelete(c) if c.id == Snowflake::new(1001)));

        let guild = h.state.guild(Snowflake::new(100)).unwrap();
        assert!(guild.scheduled_event(Snowflake::new(70)).is_none());
        assert!(h.state.message(Snowflake::new(9)).is_none());
    }

    #[tokio::test]
    async fn test_private_channel_lifecycle() {
        let mut h = joined().await;
        let dm = json!({"id": "3000", "type": 1, "recipients": [{"id": "42", "username": "friend"}]});
        h.send("CHANNEL_CREATE", dm.clone());
        h.send("CHANNEL_CREATE", dm);
        assert!(matches!(h.drain().as_slice(), [Event::ChannelCreate(c)] if c.is_private()));
        assert_eq!(
            h.state.private_channel_by_user(Snowflake::new(42)).unwrap().id,
            Snowflake::new(3000)
        );

        h.send("CHANNEL_DELETE", json!({"id": "3000", "type": 1}));
        assert!(matches!(h.drain().as_slice(), [Event::ChannelDelete(_)]));
        assert!(h.state.user(Snowflake::new(42)).is_none());
    }

    #[tokio::test]
    async fn test_private_channel_update_moves_recipients() {
        let mut h = joined().await;
        h.send(
            "CHANNEL_CREATE",
            json!({"id": "3000", "type": 1, "recipients": [{"id": "42", "username": "friend"}]}),
        );
        h.send(
            "CHANNEL_UPDATE",
            json!({"id": "3000", "type": 1, "recipients": [{"id": "43", "username": "other"}]}),
        );
        let events = h.drain();
        assert!(matches!(&events[1], Event::ChannelUpdate { old, new }
            if old.recipient_ids == vec![Snowflake::new(42)] && new.recipient_ids == vec![Snowflake::new(43)]));
        assert!(h.state.private_channel_by_user(Snowflake::new(42)).is_none());
        assert_eq!(
            h.state.private_channel_by_user(Snowflake::new(43)).unwrap().id,
            Snowflake::new(3000)
        );
        assert!(h.state.user(Snowflake::new(42)).is_none());

        h.send("CHANNEL_DELETE", json!({"id": "3000", "type": 1}));
        h.drain();
        assert!(h.state.user(Snowflake::new(43)).is_none());
    }

    #[tokio::test]
    async fn test_group_channel_duplicate_create_moves_recipients() {
        let mut h = joined().await;
        h.send(
            "CHANNEL_CREATE",
            json!({"id": "3001", "type": 3, "recipients": [{"id": "42", "username": "friend"}]}),
        );
        h.send(
            "CHANNEL_CREATE",
            json!({"id": "3001", "type": 3, "recipients": [{"id": "43", "username": "other"}]}),
        );
        assert!(matches!(h.drain().as_slice(), [Event::ChannelCreate(_)]));
        assert!(h.state.user(Snowflake::new(42)).is_none());
        assert_eq!(h.state.user(Snowflake::new(43)).unwrap().username, "other");

        h.send("CHANNEL_DELETE", json!({"id": "3001", "type": 3}));
        h.drain();
        assert!(h.state.user(Snowflake::new(43)).is_none());
    }

    #[tokio::test]
    async fn test_channel_update_and_pins() {
        let mut h = joined().await;
        h.send("CHANNEL_UPDATE", json!({"id": "1000", "type": 0, "guild_id": "100", "name": "lobby"}));
        h.send("CHANNEL_UPDATE", json!({"id": "9999", "type": 0, "guild_id": "100"}));
        h.send("CHANNEL_PINS_UPDATE", json!({"channel_id": "1000", "guild_id": "100"}));
        h.send("CHANNEL_PINS_UPDATE", json!({"channel_id": "9999"}));

        let events = h.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::ChannelUpdate { old, new } if old.name.as_deref() == Some("general") && new.name.as_deref() == Some("lobby")));
        assert!(matches!(&events[1], Event::ChannelPinsUpdate { last_pin: None, .. }));
    }

    #[tokio::test]
    async fn test_thread_events() {
        let mut h = joined().await;
        h.send("THREAD_CREATE", thread_json(500, 1000, "topic"));
        h.send("THREAD_CREATE", thread_json(500, 1000, "topic"));
        h.send("THREAD_UPDATE", thread_json(500, 1000, "renamed"));
        h.send("THREAD_DELETE", json!({"id": "500", "guild_id": "100", "parent_id": "1000", "type": 11}));
        h.send("THREAD_DELETE", json!({"id": "500", "guild_id": "100", "parent_id": "1000", "type": 11}));

        let events = h.drain();
        assert!(matches!(&events[0], Event::ThreadCreate(_)));
        assert!(matches!(&events[1], Event::ThreadUpdate { new, .. } if new.name == "renamed"));
        assert!(matches!(&events[2], Event::ThreadDelete(_)));
        assert!(matches!(&events[3], Event::RawThreadDelete(_)));
        assert!(matches!(&events[4], Event::RawThreadDelete(_)));
        assert_eq!(events.len(), 5);
    }

    #[tokio::test]
    async fn test_thread_list_sync_replaces_synced_parents() {
        let mut h = joined().await;
        h.send("THREAD_CREATE", thread_json(500, 1000, "kept"));
        h.send("THREAD_CREATE", thread_json(501, 1000, "gone"));
        h.send("THREAD_CREATE", thread_json(600, 1001, "other parent"));
        h.drain();

        h.send(
            "THREAD_LIST_SYNC",
            json!({
                "guild_id": "100",
                "channel_ids": ["1000"],
                "threads": [thread_json(500, 1000, "kept"), thread_json(502, 1000, "new")]
            }),
        );

        let events = h.drain();
        assert!(matches!(&events[0], Event::ThreadDelete(t) if t.id == Snowflake::new(501)));
        assert!(matches!(&events[1], Event::ThreadCreate(t) if t.id == Snowflake::new(502)));
        assert_eq!(events.len(), 2);

        let guild = h.state.guild(Snowflake::new(100)).unwrap();
        assert!(guild.thread(Snowflake::new(600)).is_some());
        assert!(guild.thread(Snowflake::new(500)).is_some());
    }
}
