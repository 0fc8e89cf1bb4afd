//! Private channel cache: an LRU of DM channels plus a recipient index

use std::collections::HashMap;

use chat_core::{Channel, Snowflake};

use crate::lru::LruMap;

/// Bounded DM cache.
///
/// `by_user` maps a DM recipient to their channel and is updated in the same
/// step as every insert, eviction and removal.
#[derive(Debug, Clone)]
pub struct PrivateChannels {
    channels: LruMap<Snowflake, Channel>,
    by_user: HashMap<Snowflake, Snowflake>,
}

impl PrivateChannels {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: LruMap::new(capacity),
            by_user: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.channels.capacity()
    }

    pub fn get(&self, id: Snowflake) -> Option<&Channel> {
        self.channels.peek(&id)
    }

    pub fn get_mut(&mut self, id: Snowflake) -> Option<&mut Channel> {
        self.channels.get_mut(&id)
    }

    /// DM channel with `user_id`
    pub fn by_user(&self, user_id: Snowflake) -> Option<&Channel> {
        self.by_user
            .get(&user_id)
            .and_then(|id| self.channels.peek(id))
    }

    /// Mark a channel as recently used
    pub fn touch(&mut self, id: Snowflake) -> bool {
        self.channels.touch(&id)
    }

    /// Channels from most to least recently used
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().map(|(_, channel)| channel)
    }

    /// Insert or replace a channel.
    ///
    /// Returns the replaced channel and the channel evicted to make room.
    pub fn insert(&mut self, channel: Channel) -> (Option<Channel>, Option<Channel>) {
        let id = channel.id;
        let recipient = channel.recipient_id();
        let (replaced, evicted) = self.channels.insert(id, channel);

        if let Some(old) = &replaced {
            self.unindex(old);
        }
        if let Some(user_id) = recipient {
            self.by_user.insert(user_id, id);
        }
        let evicted = evicted.map(|(_, channel)| {
            self.unindex(&channel);
            channel
        });
        (replaced, evicted)
    }

    pub fn remove(&mut self, id: Snowflake) -> Option<Channel> {
        let channel = self.channels.remove(&id)?;
        self.unindex(&channel);
        Some(channel)
    }

    /// Swap a cached channel for a new version and move its index entry.
    ///
    /// Returns the previous version; unknown channels are not inserted.
    pub fn replace(&mut self, channel: Channel) -> Option<Channel> {
        let slot = self.channels.get_mut(&channel.id)?;
        let old = std::mem::replace(slot, channel);
        self.unindex(&old);
        if let Some(current) = self.channels.peek(&old.id) {
            if let Some(user_id) = current.recipient_id() {
                self.by_user.insert(user_id, current.id);
            }
        }
        Some(old)
    }

    pub fn clear(&mut self) {
        self.channels.clear();
        self.by_user.clear();
    }

    fn unindex(&mut self, channel: &Channel) {
        if let Some(user_id) = channel.recipient_id() {
            if self.by_user.get(&user_id) == Some(&channel.id) {
                self.by_user.remove(&user_id);
            }
        }
    }

    /// Every index entry points at a cached channel
    #[cfg(test)]
    pub(crate) fn index_is_consistent(&self) -> bool {
        self.by_user
            .iter()
            .all(|(user_id, id)| {
                self.channels
                    .peek(id)
                    .is_some_and(|c| c.recipient_id() == Some(*user_id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dm(id: u64, user: u64) -> Channel {
        Channel::direct_message(Snowflake::new(id), Snowflake::new(user))
    }

    #[test]
    fn test_lookup_by_user() {
        let mut cache = PrivateChannels::new(4);
        cache.insert(dm(1, 100));

        assert_eq!(cache.by_user(Snowflake::new(100)).unwrap().id, Snowflake::new(1));
        assert!(cache.by_user(Snowflake::new(101)).is_none());
    }

    #[test]
    fn test_replace_moves_index() {
        let mut cache = PrivateChannels::new(4);
        cache.insert(dm(1, 100));

        let old = cache.replace(dm(1, 101)).unwrap();
        assert_eq!(old.recipient_id(), Some(Snowflake::new(100)));
        assert!(cache.by_user(Snowflake::new(100)).is_none());
        assert_eq!(cache.by_user(Snowflake::new(101)).unwrap().id, Snowflake::new(1));
        assert!(cache.index_is_consistent());

        assert!(cache.replace(dm(2, 102)).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_updates_index() {
        let mut cache = PrivateChannels::new(128);
        for i in 0..100 {
            cache.insert(dm(i, 10_000 + i));
        }
        for i in 100..150 {
            let (_, evicted) = cache.insert(dm(i, 10_000 + i));
            if let Some(evicted) = evicted {
                assert!(cache.by_user(evicted.recipient_id().unwrap()).is_none());
            }
            assert!(cache.len() <= 128);
        }

        assert_eq!(cache.len(), 128);
        assert!((22..150).all(|i| cache.get(Snowflake::new(i)).is_some()));
        assert!((0..22).all(|i| cache.by_user(Snowflake::new(10_000 + i)).is_none()));
        assert!(cache.index_is_consistent());
    }

    #[test]
    fn test_remove_updates_index() {
        let mut cache = PrivateChannels::new(4);
        cache.insert(dm(1, 100));
        cache.remove(Snowflake::new(1));

        assert!(cache.by_user(Snowflake::new(100)).is_none());
        assert!(cache.index_is_consistent());
    }
}
