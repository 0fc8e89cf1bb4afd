//! Member entity - a user's membership in a guild

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Guild member
///
/// The user behind the membership lives in the shared user table and is
/// referenced through `user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub nick: Option<String>,
    pub avatar: Option<String>,
    pub role_ids: Vec<Snowflake>,
    pub joined_at: Option<DateTime<Utc>>,
    pub premium_since: Option<DateTime<Utc>>,
    pub communication_disabled_until: Option<DateTime<Utc>>,
    pub deaf: bool,
    pub mute: bool,
    pub pending: bool,
    pub flags: u64,
}

impl Member {
    /// Create a new Member
    pub fn new(guild_id: Snowflake, user_id: Snowflake) -> Self {
        Self {
            guild_id,
            user_id,
            nick: None,
            avatar: None,
            role_ids: Vec::new(),
            joined_at: None,
            premium_since: None,
            communication_disabled_until: None,
            deaf: false,
            mute: false,
            pending: false,
            flags: 0,
        }
    }

    /// Get display name (nickname if set, otherwise fallback)
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.nick.as_deref().unwrap_or(fallback)
    }

    /// Check if member has a specific role
    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Drop a role that was deleted from the guild
    pub fn remove_role(&mut self, role_id: Snowflake) -> bool {
        if let Some(pos) = self.role_ids.iter().position(|&id| id == role_id) {
            self.role_ids.remove(pos);
            true
        } else {
            false
        }
    }

    /// Whether the member is timed out at `now`
    pub fn is_timed_out(&self, now: DateTime<Utc>) -> bool {
        self.communication_disabled_until
            .is_some_and(|until| until > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_member_creation() {
        let member = Member::new(Snowflake::new(100), Snowflake::new(200));
        assert_eq!(member.guild_id, Snowflake::new(100));
        assert_eq!(member.user_id, Snowflake::new(200));
        assert!(member.nick.is_none());
        assert!(member.role_ids.is_empty());
    }

    #[test]
    fn test_display_name() {
        let mut member = Member::new(Snowflake::new(1), Snowflake::new(2));
        assert_eq!(member.display_name("TestUser"), "TestUser");

        member.nick = Some("Nickname".to_string());
        assert_eq!(member.display_name("TestUser"), "Nickname");
    }

    #[test]
    fn test_remove_role() {
        let mut member = Member::new(Snowflake::new(1), Snowflake::new(2));
        member.role_ids = vec![Snowflake::new(100), Snowflake::new(101)];

        assert!(member.remove_role(Snowflake::new(100)));
        assert!(!member.remove_role(Snowflake::new(100)));
        assert!(member.has_role(Snowflake::new(101)));
    }

    #[test]
    fn test_timed_out() {
        let now = Utc::now();
        let mut member = Member::new(Snowflake::new(1), Snowflake::new(2));
        assert!(!member.is_timed_out(now));

        member.communication_disabled_until = Some(now + Duration::minutes(5));
        assert!(member.is_timed_out(now));

        member.communication_disabled_until = Some(now - Duration::minutes(5));
        assert!(!member.is_timed_out(now));
    }
}
