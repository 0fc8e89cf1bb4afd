//! Rate limiting: buckets, their registry, response headers and the global gate

mod bucket;
mod global;
mod headers;

pub use bucket::{Bucket, BucketRegistry, BucketState, BucketTicket};
pub use global::GlobalCooldown;
pub use headers::{seconds, RateLimitHeaders};
