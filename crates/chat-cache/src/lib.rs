//! # chat-cache
//!
//! In-memory caching for the client: the entity cache with its bounded
//! collections, the reference-counted user table and pending member chunk
//! requests.
//!
//! ## Example
//!
//! ```ignore
//! use chat_cache::{CacheSettings, ChunkRegistry, EntityCache};
//!
//! let mut cache = EntityCache::new(CacheSettings::default());
//! cache.store_guild(guild, member_users);
//!
//! let chunks = ChunkRegistry::new();
//! let waiter = chunks.create(guild_id);
//! let members = waiter.wait(Duration::from_secs(60)).await?;
//! ```

pub mod chunk;
pub mod lru;
pub mod private;
pub mod ring;
pub mod store;
pub mod users;

pub use chunk::{ChunkCompletion, ChunkError, ChunkRegistry, ChunkRequest, ChunkWaiter};
pub use lru::LruMap;
pub use private::PrivateChannels;
pub use ring::MessageRing;
pub use store::{CacheSettings, EntityCache};
pub use users::UserStore;
