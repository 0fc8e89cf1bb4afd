//! Test helpers for integration tests
//!
//! Provides a scripted mock of the REST API and a gateway session that
//! pushes dispatch frames through the client's event loop.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chat_client::{Client, Event, GatewaySignal};
use chat_common::ClientConfig;
use chat_core::Intents;
use chat_gateway::{ChannelSender, GatewayMessage};
use chat_http::HttpClient;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long a test waits for an event or command before failing
pub const WAIT: Duration = Duration::from_secs(5);

/// One canned response of the mock API
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub json: bool,
}

impl MockResponse {
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
            json: true,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
            json: false,
        }
    }

    pub fn empty() -> Self {
        Self::text(204, "")
    }

    /// A 429 relayed by the API proxy
    pub fn rate_limited(retry_after: f64, global: bool) -> Self {
        Self::json(
            429,
            &serde_json::json!({
                "message": "You are being rate limited.",
                "retry_after": retry_after,
                "global": global
            }),
        )
        .header("via", "1.1 google")
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Rate limit headers of a bucket with `remaining` requests left
    #[must_use]
    pub fn bucket(self, hash: &str, remaining: u32, reset_after: f64) -> Self {
        self.header("x-ratelimit-limit", "5")
            .header("x-ratelimit-remaining", &remaining.to_string())
            .header("x-ratelimit-reset-after", &reset_after.to_string())
            .header("x-ratelimit-bucket", hash)
    }

    fn into_response(self) -> Response {
        let mut builder = axum::http::Response::builder().status(self.status);
        if self.json {
            builder = builder.header("content-type", "application/json");
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(Body::from(self.body))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

/// A request the mock API received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct MockState {
    script: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock REST API answering every request from a FIFO script.
///
/// An exhausted script answers 404.
pub struct MockApi {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    _handle: JoinHandle<()>,
}

impl MockApi {
    pub async fn start() -> Result<Self> {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .fallback(respond)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/v10", self.addr)
    }

    /// Queue responses in the order they will be served
    pub fn script(&self, responses: impl IntoIterator<Item = MockResponse>) {
        self.state.script.lock().extend(responses);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }

    /// Client configuration pointing at this server
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new("test-token");
        config.http.api_base = self.base_url();
        config.http.max_attempts = 5;
        config
    }

    /// A bare HTTP client with a short 5xx backoff
    pub fn http_client(&self) -> Result<HttpClient> {
        let config = self.config();
        Ok(HttpClient::new(config.token, &config.http)?.with_backoff_unit(Duration::from_millis(10)))
    }
}

async fn respond(State(state): State<Arc<MockState>>, method: Method, uri: Uri) -> Response {
    state.requests.lock().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        at: Instant::now(),
    });
    let next = state.script.lock().pop_front();
    next.map_or_else(
        || MockResponse::json(404, &serde_json::json!({"code": 10_000, "message": "Unscripted"})).into_response(),
        MockResponse::into_response,
    )
}

/// A client whose gateway side is driven by the test
pub struct GatewaySession {
    pub client: Client,
    pub events: mpsc::UnboundedReceiver<Event>,
    pub commands: mpsc::UnboundedReceiver<(u32, GatewayMessage)>,
    sequence: AtomicU64,
}

impl GatewaySession {
    /// Start a session against `config` with every intent enabled
    pub fn start(mut config: ClientConfig) -> Result<Self> {
        config.gateway.intents = Intents::all();
        config.gateway.guild_ready_timeout_ms = 50;
        config.gateway.chunk_timeout_secs = 5;

        let (sender, commands) = ChannelSender::new();
        let (client, events) = Client::new(config, Arc::new(sender))?;
        client.start();

        Ok(Self {
            client,
            events,
            commands,
            sequence: AtomicU64::new(1),
        })
    }

    /// Push a dispatch frame for shard 0
    pub fn dispatch(&self, name: &str, data: Value) {
        self.dispatch_on(0, name, data);
    }

    pub fn dispatch_on(&self, shard_id: u32, name: &str, data: Value) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let message = GatewayMessage::dispatch(name, sequence, data);
        self.client
            .signals()
            .send(GatewaySignal::Frame { shard_id, message })
            .ok();
    }

    pub async fn next_event(&mut self) -> Result<Event> {
        match tokio::time::timeout(WAIT, self.events.recv()).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => anyhow::bail!("Event channel closed"),
            Err(_) => anyhow::bail!("Timed out waiting for an event"),
        }
    }

    /// Skip events until one matches
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&Event) -> bool) -> Result<Event> {
        loop {
            let event = self.next_event().await?;
            if predicate(&event) {
                return Ok(event);
            }
        }
    }

    /// Next op 8 sent by the client, as `(shard, nonce)`
    pub async fn next_chunk_request(&mut self) -> Result<(u32, String)> {
        let Ok(Some((shard_id, message))) = tokio::time::timeout(WAIT, self.commands.recv()).await else {
            anyhow::bail!("No gateway command was sent");
        };
        let nonce = message
            .d
            .as_ref()
            .and_then(|d| d.get("nonce"))
            .and_then(Value::as_str)
            .map(str::to_string);
        match nonce {
            Some(nonce) => Ok((shard_id, nonce)),
            None => anyhow::bail!("Command carried no nonce: {message:?}"),
        }
    }

    /// Collect whatever events are already queued
    pub fn drain(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
