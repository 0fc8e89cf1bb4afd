//! Bounded message ring buffer

use std::collections::VecDeque;

use chat_core::{Message, Snowflake};

/// Insertion-ordered message buffer; the oldest entry drops when full
#[derive(Debug, Clone)]
pub struct MessageRing {
    capacity: usize,
    messages: VecDeque<Message>,
}

impl MessageRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, returning the one pushed out if the ring was full
    pub fn push(&mut self, message: Message) -> Option<Message> {
        let evicted = if self.messages.len() >= self.capacity {
            self.messages.pop_front()
        } else {
            None
        };
        self.messages.push_back(message);
        evicted
    }

    /// Lookup by ID, scanning from the newest entry
    pub fn find(&self, id: Snowflake) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.id == id)
    }

    pub fn find_mut(&mut self, id: Snowflake) -> Option<&mut Message> {
        self.messages.iter_mut().rev().find(|m| m.id == id)
    }

    pub fn remove(&mut self, id: Snowflake) -> Option<Message> {
        let pos = self.messages.iter().rposition(|m| m.id == id)?;
        self.messages.remove(pos)
    }

    /// Remove every message matching `predicate`
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<Message>
    where
        F: FnMut(&Message) -> bool,
    {
        let (removed, kept): (Vec<Message>, Vec<Message>) =
            self.messages.drain(..).partition(|m| predicate(m));
        self.messages.extend(kept);
        removed
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn drain(&mut self) -> Vec<Message> {
        self.messages.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: u64) -> Message {
        Message::new(Snowflake::new(id), Snowflake::new(1), Snowflake::new(2), "hi")
    }

    #[test]
    fn test_full_ring_keeps_newest() {
        let mut ring = MessageRing::new(3);
        for id in 1..=3 {
            assert!(ring.push(message(id)).is_none());
        }

        let evicted = ring.push(message(4)).unwrap();
        assert_eq!(evicted.id, Snowflake::new(1));
        assert_eq!(ring.len(), 3);

        let ids: Vec<u64> = ring.iter().map(|m| m.id.get()).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_find_and_remove() {
        let mut ring = MessageRing::new(10);
        ring.push(message(1));
        ring.push(message(2));

        assert!(ring.find(Snowflake::new(2)).is_some());
        assert!(ring.find(Snowflake::new(9)).is_none());

        ring.find_mut(Snowflake::new(1)).unwrap().content = "edited".into();
        assert_eq!(ring.find(Snowflake::new(1)).unwrap().content, "edited");

        assert!(ring.remove(Snowflake::new(1)).is_some());
        assert!(ring.remove(Snowflake::new(1)).is_none());
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_remove_where_keeps_order() {
        let mut ring = MessageRing::new(10);
        for id in 1..=5 {
            ring.push(message(id));
        }
        let removed = ring.remove_where(|m| m.id.get() % 2 == 0);

        assert_eq!(removed.len(), 2);
        let ids: Vec<u64> = ring.iter().map(|m| m.id.get()).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
