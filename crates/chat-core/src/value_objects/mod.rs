//! Value objects - small copyable types shared by every layer

mod intents;
mod snowflake;

pub use intents::{Intents, MemberCacheFlags};
pub use snowflake::{Snowflake, SnowflakeParseError};
