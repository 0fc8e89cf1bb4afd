//! Bounded least-recently-used map
//!
//! Recency is tracked with a monotonically increasing tick per entry and an
//! ordered index from tick to key, so eviction pops the smallest tick.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    tick: u64,
}

/// Map holding at most `capacity` entries, evicting the least recently used
#[derive(Debug, Clone)]
pub struct LruMap<K, V> {
    capacity: usize,
    entries: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    tick: u64,
}

impl<K, V> LruMap<K, V>
where
    K: Hash + Eq + Copy,
{
    /// Create an empty map; a capacity of 0 is treated as 1
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: BTreeMap::new(),
            tick: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Read without touching recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    /// Read and mark as most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.touch(key);
        self.peek(key)
    }

    /// Mutable access, marking the entry as most recently used
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.touch(key);
        self.entries.get_mut(key).map(|slot| &mut slot.value)
    }

    /// Mark an entry as most recently used
    pub fn touch(&mut self, key: &K) -> bool {
        let next = self.next_tick();
        match self.entries.get_mut(key) {
            Some(slot) => {
                self.order.remove(&slot.tick);
                slot.tick = next;
                self.order.insert(next, *key);
                true
            }
            None => false,
        }
    }

    /// Insert or replace an entry as most recently used.
    ///
    /// Returns the replaced value for the same key, and the evicted entry
    /// if the map was full.
    pub fn insert(&mut self, key: K, value: V) -> (Option<V>, Option<(K, V)>) {
        let tick = self.next_tick();
        let replaced = self.entries.insert(key, Slot { value, tick }).map(|old| {
            self.order.remove(&old.tick);
            old.value
        });
        self.order.insert(tick, key);

        let evicted = if self.entries.len() > self.capacity {
            self.pop_oldest()
        } else {
            None
        };
        (replaced, evicted)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.entries.remove(key)?;
        self.order.remove(&slot.tick);
        Some(slot.value)
    }

    /// Remove the least recently used entry
    pub fn pop_oldest(&mut self) -> Option<(K, V)> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key).map(|slot| (key, slot.value))
    }

    /// Entries from most to least recently used
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .values()
            .rev()
            .filter_map(|key| self.entries.get_key_value(key).map(|(k, slot)| (k, &slot.value)))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}
