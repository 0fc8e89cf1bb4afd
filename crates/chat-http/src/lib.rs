//! # chat-http
//!
//! Rate-limited REST client. Requests are serialized per bucket (method,
//! route template and major parameters), retried on marked 429s and
//! transient server failures, and paused globally after a global 429.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod file;
pub mod ratelimit;
pub mod route;

// Re-export commonly used types at crate root
pub use client::{HttpClient, RequestBody};
pub use endpoints::{
    BotGateway, CreateMessage, EditChannel, EditMember, EditMessage, EditProfile, HistoryQuery,
};
pub use error::{flatten_errors, ApiError, HttpError};
pub use file::File;
pub use ratelimit::{BucketRegistry, GlobalCooldown, RateLimitHeaders};
pub use route::Route;
