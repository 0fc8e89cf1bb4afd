//! Guild scheduled event entity

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Lifecycle status of a scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScheduledEventStatus {
    #[default]
    Scheduled,
    Active,
    Completed,
    Canceled,
    Unknown(u8),
}

impl From<u8> for ScheduledEventStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Scheduled,
            2 => Self::Active,
            3 => Self::Completed,
            4 => Self::Canceled,
            other => Self::Unknown(other),
        }
    }
}

/// Where a scheduled event takes place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScheduledEventEntity {
    StageInstance,
    #[default]
    Voice,
    External,
    Unknown(u8),
}

impl From<u8> for ScheduledEventEntity {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::StageInstance,
            2 => Self::Voice,
            3 => Self::External,
            other => Self::Unknown(other),
        }
    }
}

/// Guild scheduled event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    /// Voice or stage channel hosting the event; `None` for external events
    pub channel_id: Option<Snowflake>,
    pub creator_id: Option<Snowflake>,
    pub name: String,
    pub description: Option<String>,
    pub scheduled_start_time: Option<DateTime<Utc>>,
    pub scheduled_end_time: Option<DateTime<Utc>>,
    pub status: ScheduledEventStatus,
    pub entity_type: ScheduledEventEntity,
    pub location: Option<String>,
    pub user_count: u32,
}

impl ScheduledEvent {
    pub fn new(id: Snowflake, guild_id: Snowflake, name: impl Into<String>) -> Self {
        Self {
            id,
            guild_id,
            channel_id: None,
            creator_id: None,
            name: name.into(),
            description: None,
            scheduled_start_time: None,
            scheduled_end_time: None,
            status: ScheduledEventStatus::default(),
            entity_type: ScheduledEventEntity::default(),
            location: None,
            user_count: 0,
        }
    }

    pub fn add_subscriber(&mut self) {
        self.user_count = self.user_count.saturating_add(1);
    }

    pub fn remove_subscriber(&mut self) {
        self.user_count = self.user_count.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_count_saturates() {
        let mut event = ScheduledEvent::new(Snowflake::new(1), Snowflake::new(2), "standup");
        event.remove_subscriber();
        assert_eq!(event.user_count, 0);

        event.add_subscriber();
        assert_eq!(event.user_count, 1);
    }

    #[test]
    fn test_status_from_wire() {
        assert_eq!(ScheduledEventStatus::from(2), ScheduledEventStatus::Active);
        assert_eq!(ScheduledEventStatus::from(7), ScheduledEventStatus::Unknown(7));
        assert_eq!(ScheduledEventEntity::from(1), ScheduledEventEntity::StageInstance);
    }
}
