//! Bot token handling
//!
//! The token never shows up in `Debug` output or logs.

use std::fmt;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chat_core::Snowflake;
use serde::Deserialize;

/// Bot token sent in the `Authorization` header
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct BotToken(String);

impl BotToken {
    /// Wrap a raw token, dropping a leading `Bot ` prefix if the caller kept it
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let trimmed = token.trim();
        let raw = trimmed.strip_prefix("Bot ").unwrap_or(trimmed);
        Self(raw.to_string())
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bot {}", self.0)
    }

    /// The raw secret
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The bot's user ID, encoded in the first token segment
    pub fn bot_id(&self) -> Option<Snowflake> {
        let segment = self.0.split('.').next()?;
        let decoded = URL_SAFE_NO_PAD
            .decode(segment.trim_end_matches('='))
            .or_else(|_| STANDARD_NO_PAD.decode(segment.trim_end_matches('=')))
            .ok()?;
        let text = String::from_utf8(decoded).ok()?;
        Snowflake::parse(&text).ok()
    }
}

impl From<String> for BotToken {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken(<redacted>)")
    }
}
