//! Pending member chunk requests
//!
//! A request is created with a random nonce and collects the members of
//! every `GUILD_MEMBERS_CHUNK` carrying that nonce. The terminal chunk
//! resolves all waiters with the full buffer in arrival order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chat_core::{Member, Snowflake};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

type ChunkResult = Result<Vec<Member>, ChunkError>;

/// Why a chunk waiter did not receive the full member list
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChunkError {
    #[error("member chunk request timed out after {} members", .partial.len())]
    TimedOut { partial: Vec<Member> },

    #[error("member chunk request cancelled after {} members", .partial.len())]
    Cancelled { partial: Vec<Member> },
}

impl ChunkError {
    /// Members received before the request ended
    pub fn partial(&self) -> &[Member] {
        match self {
            Self::TimedOut { partial } | Self::Cancelled { partial } => partial,
        }
    }
}

/// One in-flight "all members of guild X" request
#[derive(Debug)]
pub struct ChunkRequest {
    pub guild_id: Snowflake,
    pub nonce: String,
    pub buffer: Vec<Member>,
    waiters: Vec<oneshot::Sender<ChunkResult>>,
}

impl ChunkRequest {
    fn resolve(self, result: &ChunkResult) {
        for waiter in self.waiters {
            // A waiter that gave up has dropped its receiver
            let _ = waiter.send(result.clone());
        }
    }
}

/// Terminal chunk outcome handed back to the caller
#[derive(Debug, Clone)]
pub struct ChunkCompletion {
    pub guild_id: Snowflake,
    pub nonce: String,
    pub members: Vec<Member>,
}

/// Registry of pending chunk requests, keyed by nonce
#[derive(Debug, Clone, Default)]
pub struct ChunkRegistry {
    requests: Arc<Mutex<HashMap<String, ChunkRequest>>>,
}

impl ChunkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }

    /// Number of pending requests for a guild
    pub fn pending_for(&self, guild_id: Snowflake) -> usize {
        self.requests
            .lock()
            .values()
            .filter(|r| r.guild_id == guild_id)
            .count()
    }

    /// Start a request for `guild_id`. Concurrent requests for the same
    /// guild stay independent.
    pub fn create(&self, guild_id: Snowflake) -> ChunkWaiter {
        let nonce = generate_nonce();
        let (tx, rx) = oneshot::channel();
        self.requests.lock().insert(
            nonce.clone(),
            ChunkRequest {
                guild_id,
                nonce: nonce.clone(),
                buffer: Vec::new(),
                waiters: vec![tx],
            },
        );
        debug!(guild_id = %guild_id, nonce = %nonce, "Created member chunk request");

        ChunkWaiter {
            nonce,
            guild_id,
            rx,
            registry: self.clone(),
        }
    }

    /// Attach another waiter to a pending request
    pub fn subscribe(&self, nonce: &str) -> Option<ChunkWaiter> {
        let mut requests = self.requests.lock();
        let request = requests.get_mut(nonce)?;
        let (tx, rx) = oneshot::channel();
        request.waiters.push(tx);

        Some(ChunkWaiter {
            nonce: nonce.to_string(),
            guild_id: request.guild_id,
            rx,
            registry: self.clone(),
        })
    }

    /// Feed one chunk.
    ///
    /// On the terminal chunk the request is removed, its waiters resolve and
    /// the completion is returned. Unknown nonces are ignored.
    pub fn on_chunk(
        &self,
        nonce: &str,
        members: Vec<Member>,
        is_last: bool,
    ) -> Option<ChunkCompletion> {
        let mut requests = self.requests.lock();
        let Some(request) = requests.get_mut(nonce) else {
            debug!(nonce = %nonce, "Chunk for unknown request");
            return None;
        };
        request.buffer.extend(members);
        if !is_last {
            return None;
        }

        let request = requests.remove(nonce)?;
        drop(requests);

        let completion = ChunkCompletion {
            guild_id: request.guild_id,
            nonce: request.nonce.clone(),
            members: request.buffer.clone(),
        };
        request.resolve(&Ok(completion.members.clone()));
        Some(completion)
    }

    /// End a request early with a timeout, returning what arrived so far
    pub fn expire(&self, nonce: &str) -> Option<Vec<Member>> {
        let request = self.requests.lock().remove(nonce)?;
        warn!(guild_id = %request.guild_id, nonce = %nonce, received = request.buffer.len(), "Member chunk request timed out");
        let partial = request.buffer.clone();
        request.resolve(&Err(ChunkError::TimedOut {
            partial: partial.clone(),
        }));
        Some(partial)
    }

    /// Cancel one request, e.g. when the command could not be sent
    pub fn cancel(&self, nonce: &str) -> bool {
        let Some(request) = self.requests.lock().remove(nonce) else {
            return false;
        };
        let partial = request.buffer.clone();
        request.resolve(&Err(ChunkError::Cancelled { partial }));
        true
    }

    /// Cancel every pending request, e.g. when the session is invalidated
    pub fn cancel_all(&self) -> usize {
        let requests: Vec<ChunkRequest> = self.requests.lock().drain().map(|(_, r)| r).collect();
        let count = requests.len();
        for request in requests {
            let partial = request.buffer.clone();
            request.resolve(&Err(ChunkError::Cancelled { partial }));
        }
        if count > 0 {
            debug!(count, "Cancelled pending member chunk requests");
        }
        count
    }
}

/// Handle to await the result of a chunk request
#[derive(Debug)]
pub struct ChunkWaiter {
    nonce: String,
    guild_id: Snowflake,
    rx: oneshot::Receiver<ChunkResult>,
    registry: ChunkRegistry,
}

impl ChunkWaiter {
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    /// Wait for the request to finish.
    ///
    /// Timing out removes the request so nothing lingers in the registry.
    pub async fn wait(self, timeout: Duration) -> ChunkResult {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ChunkError::Cancelled {
                partial: Vec::new(),
            }),
            Err(_) => {
                let partial = self.registry.expire(&self.nonce).unwrap_or_default();
                Err(ChunkError::TimedOut { partial })
            }
        }
    }
}

/// 16 random bytes, hex encoded (the gateway caps nonces at 32 characters)
fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
