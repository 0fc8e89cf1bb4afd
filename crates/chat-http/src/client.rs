//! Request dispatcher
//!
//! Every request runs inside its rate-limit bucket. Within one bucket
//! requests are serialized; different buckets proceed concurrently. A global
//! cooldown, once triggered, blocks all buckets.

use std::time::Duration;

use chat_common::{BotToken, HttpConfig};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, VIA};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{ApiError, HttpError};
use crate::file::{build_form, validate_files, File};
use crate::ratelimit::{seconds, BucketRegistry, GlobalCooldown, RateLimitHeaders};
use crate::route::Route;

/// Body of a request
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// `payload_json` plus `files[n]` parts
    Multipart {
        payload: Option<Value>,
        files: Vec<File>,
    },
}

impl RequestBody {
    pub fn json<T: serde::Serialize>(payload: &T) -> Result<Self, HttpError> {
        Ok(Self::Json(serde_json::to_value(payload)?))
    }

    /// JSON body, or multipart when files are attached
    pub fn with_files<T: serde::Serialize>(payload: &T, files: Vec<File>) -> Result<Self, HttpError> {
        let payload = serde_json::to_value(payload)?;
        if files.is_empty() {
            Ok(Self::Json(payload))
        } else {
            Ok(Self::Multipart {
                payload: Some(payload),
                files,
            })
        }
    }
}

/// Rate-limited REST client
#[derive(Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    token: BotToken,
    api_base: String,
    registry: BucketRegistry,
    global: GlobalCooldown,
    use_clock: bool,
    max_attempts: u32,
    backoff_unit: Duration,
}

impl HttpClient {
    /// Create a new client
    pub fn new(token: BotToken, config: &HttpConfig) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            token,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            registry: BucketRegistry::new(),
            global: GlobalCooldown::new(),
            use_clock: config.use_clock,
            max_attempts: config.max_attempts.max(1),
            backoff_unit: Duration::from_secs(1),
        })
    }

    /// Scale the 5xx backoff; the n-th retry waits `(1 + 2n) * unit`
    #[must_use]
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn registry(&self) -> &BucketRegistry {
        &self.registry
    }

    pub fn global_cooldown(&self) -> &GlobalCooldown {
        &self.global
    }

    /// Execute and deserialize the response body
    pub async fn request<T: DeserializeOwned>(
        &self,
        route: Route,
        body: RequestBody,
    ) -> Result<T, HttpError> {
        let value = self.execute(route, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Execute a request through its bucket.
    ///
    /// Returns the decoded body: JSON, text, or `Null` for empty responses.
    pub async fn execute(&self, route: Route, body: RequestBody) -> Result<Value, HttpError> {
        if let RequestBody::Multipart { files, .. } = &body {
            validate_files(files)?;
        }

        let bucket = self.registry.bucket(&route);
        let ticket = bucket.acquire().await;
        let mut attempt: u32 = 0;

        loop {
            self.global.wait().await;

            trace!(route = %route, bucket = %ticket.bucket().key(), attempt, "Sending request");
            let response = match self.build(&route, &body)?.send().await {
                Ok(response) => response,
                Err(e) if is_transient(&e) && attempt + 1 < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(route = %route, attempt, ?delay, error = %e, "Connection failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(HttpError::Transport(e)),
            };

            let headers = RateLimitHeaders::parse(response.headers());
            ticket.update(&headers);
            if let Some(hash) = &headers.bucket {
                self.registry.record_hash(&route, hash);
            }
            let delay = headers.exhausted_for(self.use_clock, now_epoch_secs());

            let status = response.status();
            let marked = response.headers().contains_key(VIA);
            let is_json = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.starts_with("application/json"));
            let text = response.text().await?;

            if status.is_success() {
                debug!(route = %route, status = status.as_u16(), remaining = ?headers.remaining, "Request succeeded");
                ticket.release(delay);
                return decode_body(&text, is_json);
            }

            let body_value = decode_body(&text, is_json).unwrap_or(Value::String(text));

            if status == StatusCode::TOO_MANY_REQUESTS {
                // Only a 429 relayed by the API proxy is trustworthy; anything
                // else is an edge block that retrying will not fix
                if !(marked && is_json) {
                    warn!(route = %route, "Unmarked 429, not retrying");
                    ticket.release(delay);
                    return Err(HttpError::RateLimited {
                        retry_after: headers.retry_after.map(seconds),
                        global: headers.global,
                    });
                }

                let retry_after = body_value
                    .get("retry_after")
                    .and_then(Value::as_f64)
                    .or(headers.retry_after)
                    .map_or(Duration::ZERO, seconds);
                let global = headers.global
                    || body_value
                        .get("global")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);

                warn!(
                    route = %route,
                    bucket = %ticket.bucket().key(),
                    scope = headers.scope.as_deref().unwrap_or("user"),
                    ?retry_after,
                    global,
                    "Rate limited, retrying"
                );

                if global {
                    self.global.activate(retry_after);
                } else {
                    tokio::time::sleep(retry_after).await;
                }
                continue;
            }

            if is_retryable_status(status) && attempt + 1 < self.max_attempts {
                let backoff = self.backoff(attempt);
                warn!(route = %route, status = status.as_u16(), attempt, ?backoff, "Server error, retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            ticket.release(delay);
            let error = ApiError::from_body(&body_value);
            debug!(route = %route, status = status.as_u16(), code = error.code, "Request failed");
            return Err(match status.as_u16() {
                403 => HttpError::Forbidden(error),
                404 => HttpError::NotFound(error),
                status if status >= 500 => HttpError::ServerError { status, error },
                status => HttpError::Http { status, error },
            });
        }
    }

    fn build(&self, route: &Route, body: &RequestBody) -> Result<RequestBuilder, HttpError> {
        let mut request = self
            .http
            .request(route.method().clone(), route.url(&self.api_base))
            .header(AUTHORIZATION, self.token.authorization());

        if !route.query_pairs().is_empty() {
            request = request.query(route.query_pairs());
        }

        Ok(match body {
            RequestBody::Empty => request,
            RequestBody::Json(payload) => request.json(payload),
            RequestBody::Multipart { payload, files } => {
                request.multipart(build_form(payload.as_ref(), files)?)
            }
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * (1 + attempt * 2)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502 | 504)
}

/// Connect failures, timeouts and resets somewhere in the error chain
fn is_transient(error: &reqwest::Error) -> bool {
    if error.is_connect() || error.is_timeout() {
        return true;
    }

    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        source = err.source();
    }
    false
}

fn decode_body(text: &str, is_json: bool) -> Result<Value, HttpError> {
    if text.is_empty() {
        Ok(Value::Null)
    } else if is_json {
        Ok(serde_json::from_str(text)?)
    } else {
        Ok(Value::String(text.to_string()))
    }
}

fn now_epoch_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_common::ClientConfig;
    use serde_json::json;

    fn client() -> HttpClient {
        let config = ClientConfig::new("token");
        HttpClient::new(config.token, &config.http).unwrap()
    }

    #[test]
    fn test_backoff_schedule() {
        let client = client();
        let delays: Vec<u64> = (0..4).map(|a| client.backoff(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(!is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body("", true).unwrap(), Value::Null);
        assert_eq!(decode_body("{\"a\":1}", true).unwrap(), json!({"a": 1}));
        assert_eq!(decode_body("plain", false).unwrap(), json!("plain"));
        assert!(decode_body("{broken", true).is_err());
    }

    #[test]
    fn test_with_files_picks_body_kind() {
        let body = RequestBody::with_files(&json!({"content": "x"}), Vec::new()).unwrap();
        assert!(matches!(body, RequestBody::Json(_)));

        let body =
            RequestBody::with_files(&json!({"content": "x"}), vec![File::new("a", vec![1])]).unwrap();
        assert!(matches!(body, RequestBody::Multipart { .. }));
    }

    #[tokio::test]
    async fn test_invalid_files_fail_before_io() {
        // Nothing listens on the base URL; validation must reject first
        let client = client();
        let body = RequestBody::Multipart {
            payload: None,
            files: vec![File::new("empty.txt", Vec::new())],
        };
        let result = client
            .execute(Route::post("/channels/{channel_id}/messages").param("channel_id", 1), body)
            .await;

        assert!(matches!(result, Err(HttpError::Validation(_))));
        assert!(client.registry().is_empty());
    }

    #[tokio::test]
    async fn test_connection_failures_retry_then_fail() {
        // Bind and drop a listener so the port refuses connections
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut config = ClientConfig::new("token");
        config.http.api_base = format!("http://127.0.0.1:{port}/api/v10");
        config.http.max_attempts = 3;
        let client = HttpClient::new(config.token, &config.http)
            .unwrap()
            .with_backoff_unit(Duration::from_millis(20));

        let started = std::time::Instant::now();
        let result = client
            .execute(Route::get("/users/@me"), RequestBody::Empty)
            .await;

        match result {
            Err(HttpError::Transport(e)) => assert!(e.is_connect()),
            other => panic!("expected transport error, got {other:?}"),
        }
        // Two backoffs: 20ms then 60ms
        assert!(started.elapsed() >= Duration::from_millis(80));
    }
}
