//! Voice state entity

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// A user's voice connection state within a guild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceState {
    pub guild_id: Option<Snowflake>,
    /// `None` once the user disconnected
    pub channel_id: Option<Snowflake>,
    pub user_id: Snowflake,
    pub session_id: String,
    pub deaf: bool,
    pub mute: bool,
    pub self_deaf: bool,
    pub self_mute: bool,
    pub self_stream: bool,
    pub self_video: bool,
    pub suppress: bool,
    pub request_to_speak_at: Option<DateTime<Utc>>,
}

impl VoiceState {
    pub fn new(user_id: Snowflake, channel_id: Option<Snowflake>) -> Self {
        Self {
            guild_id: None,
            channel_id,
            user_id,
            session_id: String::new(),
            deaf: false,
            mute: false,
            self_deaf: false,
            self_mute: false,
            self_stream: false,
            self_video: false,
            suppress: false,
            request_to_speak_at: None,
        }
    }

    /// Check if the user is connected to a channel
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.channel_id.is_some()
    }
}
