//! Rate-limit response headers

use std::time::Duration;

use reqwest::header::HeaderMap;

pub const LIMIT: &str = "x-ratelimit-limit";
pub const REMAINING: &str = "x-ratelimit-remaining";
pub const RESET: &str = "x-ratelimit-reset";
pub const RESET_AFTER: &str = "x-ratelimit-reset-after";
pub const BUCKET: &str = "x-ratelimit-bucket";
pub const GLOBAL: &str = "x-ratelimit-global";
pub const SCOPE: &str = "x-ratelimit-scope";
pub const RETRY_AFTER: &str = "retry-after";

/// Rate-limit state reported by one response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitHeaders {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    /// Epoch seconds at which the bucket resets
    pub reset: Option<f64>,
    /// Seconds until the bucket resets
    pub reset_after: Option<f64>,
    pub bucket: Option<String>,
    pub global: bool,
    /// `user`, `global` or `shared`
    pub scope: Option<String>,
    pub retry_after: Option<f64>,
}

impl RateLimitHeaders {
    pub fn parse(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        Self {
            limit: text(LIMIT).and_then(|v| v.parse().ok()),
            remaining: text(REMAINING).and_then(|v| v.parse().ok()),
            reset: text(RESET).and_then(|v| v.parse().ok()),
            reset_after: text(RESET_AFTER).and_then(|v| v.parse().ok()),
            bucket: text(BUCKET).map(str::to_string),
            global: text(GLOBAL).is_some_and(|v| v.eq_ignore_ascii_case("true")),
            scope: text(SCOPE).map(str::to_string),
            retry_after: text(RETRY_AFTER).and_then(|v| v.parse().ok()),
        }
    }

    /// How long the bucket stays exhausted.
    ///
    /// Only set when the response reported zero remaining requests. With
    /// `use_clock` the deadline comes from `X-RateLimit-Reset` against the
    /// local clock, otherwise from `X-RateLimit-Reset-After`.
    pub fn exhausted_for(&self, use_clock: bool, now_epoch_secs: f64) -> Option<Duration> {
        if self.remaining != Some(0) {
            return None;
        }

        let secs = if use_clock {
            self.reset
                .map(|reset| reset - now_epoch_secs)
                .or(self.reset_after)?
        } else {
            self.reset_after
                .or_else(|| self.reset.map(|reset| reset - now_epoch_secs))?
        };

        Some(seconds(secs))
    }
}

/// Convert fractional seconds, clamping negatives (clock skew) to zero
pub fn seconds(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}
