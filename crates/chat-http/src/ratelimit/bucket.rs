//! Rate-limit buckets and the per-client registry

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::debug;

use super::RateLimitHeaders;
use crate::route::Route;

/// Last known state of a bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketState {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    /// When a deferred release lets the next request through
    pub release_at: Option<Instant>,
}

/// One serialization domain: requests sharing a bucket run one at a time
#[derive(Debug)]
pub struct Bucket {
    key: String,
    lock: Arc<Mutex<()>>,
    state: parking_lot::Mutex<BucketState>,
}

impl Bucket {
    pub fn new(key: String) -> Self {
        Self {
            key,
            lock: Arc::new(Mutex::new(())),
            state: parking_lot::Mutex::new(BucketState::default()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> BucketState {
        *self.state.lock()
    }

    /// Whether a request currently holds the bucket
    pub fn is_locked(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    /// Wait for exclusive use of the bucket
    pub async fn acquire(self: &Arc<Self>) -> BucketTicket {
        let guard = Arc::clone(&self.lock).lock_owned().await;
        BucketTicket {
            bucket: Arc::clone(self),
            guard: Some(guard),
        }
    }
}

/// Exclusive hold on a bucket for the duration of one request
#[derive(Debug)]
pub struct BucketTicket {
    bucket: Arc<Bucket>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl BucketTicket {
    pub fn bucket(&self) -> &Bucket {
        &self.bucket
    }

    /// Record what the latest response said about the bucket
    pub fn update(&self, headers: &RateLimitHeaders) {
        let mut state = self.bucket.state.lock();
        if headers.limit.is_some() {
            state.limit = headers.limit;
        }
        if headers.remaining.is_some() {
            state.remaining = headers.remaining;
        }
    }

    /// Give the bucket back.
    ///
    /// With a delay the bucket stays locked until it elapses, so the next
    /// queued request waits out the window.
    pub fn release(mut self, delay: Option<Duration>) {
        let Some(guard) = self.guard.take() else {
            return;
        };

        match delay {
            Some(delay) if !delay.is_zero() => {
                let release_at = Instant::now() + delay;
                self.bucket.state.lock().release_at = Some(release_at);
                debug!(bucket = %self.bucket.key, ?delay, "Bucket exhausted, deferring release");

                let bucket = Arc::clone(&self.bucket);
                tokio::spawn(async move {
                    tokio::time::sleep_until(release_at).await;
                    bucket.state.lock().release_at = None;
                    drop(guard);
                });
            }
            _ => drop(guard),
        }
    }
}

/// Buckets of one client, created lazily
#[derive(Debug, Default)]
pub struct BucketRegistry {
    buckets: DashMap<String, Arc<Bucket>>,
    /// Route key -> bucket hash reported by the server
    hashes: DashMap<String, String>,
}

impl BucketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for `route`: the server's bucket hash when known, the route
    /// template otherwise, followed by the major parameters
    pub fn bucket_key(&self, route: &Route) -> String {
        let route_key = route.route_key();
        let id = self
            .hashes
            .get(&route_key)
            .map_or(route_key, |hash| hash.value().clone());
        format!("{id}:{}", route.major())
    }

    /// Bucket for `route`, created on first use
    pub fn bucket(&self, route: &Route) -> Arc<Bucket> {
        let key = self.bucket_key(route);
        self.buckets
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Bucket::new(key)))
            .value()
            .clone()
    }

    /// Remember the server-side bucket hash for the route's template.
    ///
    /// Returns true when the mapping changed.
    pub fn record_hash(&self, route: &Route, hash: &str) -> bool {
        let route_key = route.route_key();
        if self.hashes.get(&route_key).is_some_and(|h| h.value() == hash) {
            return false;
        }
        debug!(route = %route_key, bucket_hash = %hash, "Discovered rate limit bucket");
        self.hashes.insert(route_key, hash.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
