//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present), falling back to the defaults below.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chat_core::{Intents, MemberCacheFlags};
use serde::Deserialize;

use crate::auth::BotToken;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub token: BotToken,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// REST dispatcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts for 5xx responses and connection failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Compute bucket resets from `X-RateLimit-Reset` and the local clock
    /// instead of trusting `X-RateLimit-Reset-After`
    #[serde(default)]
    pub use_clock: bool,
}

/// Gateway session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub intents: Intents,
    #[serde(default = "default_shard_count")]
    pub shard_count: u32,
    #[serde(default)]
    pub compress: bool,
    #[serde(default = "default_guild_ready_timeout_ms")]
    pub guild_ready_timeout_ms: u64,
    #[serde(default = "default_chunk_timeout_secs")]
    pub chunk_timeout_secs: u64,
}

/// Entity cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// `None` disables the message cache entirely
    #[serde(default = "default_max_messages")]
    pub max_messages: Option<usize>,
    #[serde(default = "default_chunk_at_startup")]
    pub chunk_at_startup: bool,
    /// Derived from the intents when unset
    #[serde(skip)]
    pub member_cache_flags: Option<MemberCacheFlags>,
    #[serde(default = "default_private_channel_capacity")]
    pub private_channel_capacity: usize,
}

// Default value functions
fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_user_agent() -> String {
    format!("DiscordBot (chat-client, {})", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_shard_count() -> u32 {
    1
}

fn default_guild_ready_timeout_ms() -> u64 {
    2_000
}

fn default_chunk_timeout_secs() -> u64 {
    60
}

#[allow(clippy::unnecessary_wraps)]
fn default_max_messages() -> Option<usize> {
    Some(1000)
}

fn default_chunk_at_startup() -> bool {
    true
}

fn default_private_channel_capacity() -> usize {
    128
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            use_clock: false,
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            intents: Intents::default(),
            shard_count: default_shard_count(),
            compress: false,
            guild_ready_timeout_ms: default_guild_ready_timeout_ms(),
            chunk_timeout_secs: default_chunk_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    #[must_use]
    pub fn guild_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.guild_ready_timeout_ms)
    }

    #[must_use]
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            chunk_at_startup: default_chunk_at_startup(),
            member_cache_flags: None,
            private_channel_capacity: default_private_channel_capacity(),
        }
    }
}

impl ClientConfig {
    /// Build a configuration with defaults for everything but the token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: BotToken::new(token),
            http: HttpConfig::default(),
            gateway: GatewayConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `CHAT_TOKEN` is missing or an override does not parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("CHAT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingVar("CHAT_TOKEN"))?;
        let mut config = Self::new(token);

        if let Some(api_base) = lookup("CHAT_API_BASE") {
            config.http.api_base = api_base.trim_end_matches('/').to_string();
        }
        if let Some(user_agent) = lookup("CHAT_USER_AGENT") {
            config.http.user_agent = user_agent;
        }
        if let Some(secs) = parse_var(&lookup, "CHAT_HTTP_TIMEOUT_SECS")? {
            config.http.timeout_secs = secs;
        }
        if let Some(attempts) = parse_var(&lookup, "CHAT_HTTP_MAX_ATTEMPTS")? {
            config.http.max_attempts = attempts;
        }
        if let Some(use_clock) = parse_var(&lookup, "CHAT_USE_CLOCK")? {
            config.http.use_clock = use_clock;
        }

        if let Some(bits) = parse_var::<u64, _>(&lookup, "CHAT_INTENTS")? {
            config.gateway.intents = Intents::from_bits_truncate(bits);
        }
        if let Some(shards) = parse_var::<u32, _>(&lookup, "CHAT_SHARD_COUNT")? {
            if shards == 0 {
                return Err(ConfigError::InvalidValue("CHAT_SHARD_COUNT", "0".to_string()));
            }
            config.gateway.shard_count = shards;
        }
        if let Some(compress) = parse_var(&lookup, "CHAT_GATEWAY_COMPRESS")? {
            config.gateway.compress = compress;
        }
        if let Some(ms) = parse_var(&lookup, "CHAT_GUILD_READY_TIMEOUT_MS")? {
            config.gateway.guild_ready_timeout_ms = ms;
        }
        if let Some(secs) = parse_var(&lookup, "CHAT_CHUNK_TIMEOUT_SECS")? {
            config.gateway.chunk_timeout_secs = secs;
        }

        // 0 turns the message cache off
        if let Some(max) = parse_var::<usize, _>(&lookup, "CHAT_MAX_MESSAGES")? {
            config.cache.max_messages = (max > 0).then_some(max);
        }
        if let Some(chunk) = parse_var(&lookup, "CHAT_CHUNK_AT_STARTUP")? {
            config.cache.chunk_at_startup = chunk;
        }
        if let Some(capacity) = parse_var(&lookup, "CHAT_PRIVATE_CHANNEL_CAPACITY")? {
            config.cache.private_channel_capacity = capacity;
        }

        Ok(config)
    }

    /// Member cache flags, derived from the intents unless set explicitly
    #[must_use]
    pub fn member_cache_flags(&self) -> MemberCacheFlags {
        self.cache
            .member_cache_flags
            .unwrap_or_else(|| MemberCacheFlags::from_intents(self.gateway.intents))
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = ClientConfig::new("abc");
        assert_eq!(config.http.api_base, "https://discord.com/api/v10");
        assert_eq!(config.http.max_attempts, 5);
        assert!(!config.http.use_clock);
        assert_eq!(config.gateway.guild_ready_timeout(), Duration::from_secs(2));
        assert_eq!(config.gateway.chunk_timeout(), Duration::from_secs(60));
        assert_eq!(config.cache.max_messages, Some(1000));
        assert_eq!(config.cache.private_channel_capacity, 128);
        assert!(config.cache.chunk_at_startup);
    }

    #[test]
    fn test_missing_token() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("CHAT_TOKEN")));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CHAT_TOKEN", "abc"),
            ("CHAT_API_BASE", "http://127.0.0.1:9000/"),
            ("CHAT_USE_CLOCK", "true"),
            ("CHAT_INTENTS", "3"),
            ("CHAT_MAX_MESSAGES", "0"),
        ]))
        .unwrap();

        assert_eq!(config.http.api_base, "http://127.0.0.1:9000");
        assert!(config.http.use_clock);
        assert_eq!(config.gateway.intents, Intents::GUILDS | Intents::GUILD_MEMBERS);
        assert_eq!(config.cache.max_messages, None);
    }

    #[test]
    fn test_invalid_value() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("CHAT_TOKEN", "abc"),
            ("CHAT_SHARD_COUNT", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("CHAT_SHARD_COUNT", _)));
    }

    #[test]
    fn test_member_cache_flags_follow_intents() {
        let mut config = ClientConfig::new("abc");
        config.gateway.intents = Intents::GUILDS | Intents::GUILD_VOICE_STATES;
        assert_eq!(config.member_cache_flags(), MemberCacheFlags::VOICE);

        config.cache.member_cache_flags = Some(MemberCacheFlags::empty());
        assert_eq!(config.member_cache_flags(), MemberCacheFlags::empty());
    }
}
