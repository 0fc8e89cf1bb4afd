//! # chat-common
//!
//! Shared utilities including configuration, the bot token, and telemetry.

pub mod auth;
pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::BotToken;
pub use config::{CacheConfig, ClientConfig, ConfigError, GatewayConfig, HttpConfig};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
