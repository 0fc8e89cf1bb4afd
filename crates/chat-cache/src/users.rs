//! Reference-counted user table
//!
//! A user stays cached only while something owns a reference to it: a
//! guild membership, a private channel recipient or a cached message author.
//! Dropping the last reference removes the entry.

use std::collections::HashMap;

use chat_core::{Snowflake, User};
use tracing::trace;

#[derive(Debug, Clone)]
struct Entry {
    user: User,
    refs: usize,
}

/// Shared user table, one live entry per ID
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    entries: HashMap<Snowflake, Entry>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Snowflake) -> Option<&User> {
        self.entries.get(&id).map(|entry| &entry.user)
    }

    pub fn contains(&self, id: Snowflake) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of owners holding `id`
    pub fn refs(&self, id: Snowflake) -> usize {
        self.entries.get(&id).map_or(0, |entry| entry.refs)
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.entries.values().map(|entry| &entry.user)
    }

    /// Take a reference, storing or refreshing the user data
    pub fn acquire(&mut self, user: User) {
        self.entries
            .entry(user.id)
            .and_modify(|entry| {
                entry.user.clone_from(&user);
                entry.refs += 1;
            })
            .or_insert_with(|| Entry {
                user: user.clone(),
                refs: 1,
            });
    }

    /// Drop a reference; the entry goes away with the last one.
    ///
    /// Returns true when the user was removed.
    pub fn release(&mut self, id: Snowflake) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs == 0 {
            self.entries.remove(&id);
            trace!(user_id = %id, "Swept unreferenced user");
            true
        } else {
            false
        }
    }

    /// Replace the data of a cached user in place.
    ///
    /// Returns `(old, new)` when the user was cached; uncached users are
    /// not added.
    pub fn update(&mut self, user: User) -> Option<(User, User)> {
        let entry = self.entries.get_mut(&user.id)?;
        let old = std::mem::replace(&mut entry.user, user);
        Some((old, entry.user.clone()))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
