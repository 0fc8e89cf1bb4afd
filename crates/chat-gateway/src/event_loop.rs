//! Event loop
//!
//! Single consumer of gateway signals. Every cache mutation happens on the
//! task spawned here, in the order the connections delivered the frames.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, Notify};

use crate::events::{DecodeError, GatewayEvent};
use crate::protocol::{GatewayMessage, OpCode};
use crate::state::ConnectionState;

/// What a shard connection hands to the event loop
#[derive(Debug)]
pub enum GatewaySignal {
    /// Raw frame, decoded on the loop
    Frame { shard_id: u32, message: GatewayMessage },
    /// Already decoded dispatch event
    Dispatch { shard_id: u32, event: GatewayEvent },
    /// The shard reconnected without resuming
    Invalidated(u32),
}

impl GatewaySignal {
    /// Turn a received frame into a signal.
    ///
    /// Only dispatches and non-resumable Invalid Session frames concern the
    /// state; everything else yields `None`.
    pub fn from_message(shard_id: u32, message: GatewayMessage) -> Result<Option<Self>, DecodeError> {
        match message.op {
            OpCode::Dispatch => {
                let Some(name) = message.t.as_deref() else {
                    return Ok(None);
                };
                let event = GatewayEvent::decode(name, message.d.unwrap_or(Value::Null))?;
                Ok(Some(Self::Dispatch { shard_id, event }))
            }
            OpCode::InvalidSession if message.as_invalid_session() == Some(false) => {
                Ok(Some(Self::Invalidated(shard_id)))
            }
            _ => Ok(None),
        }
    }
}

pub type SignalSender = mpsc::UnboundedSender<GatewaySignal>;

/// Drains gateway signals into the connection state
pub struct EventLoop {
    state: Arc<ConnectionState>,
    signals: Mutex<Option<mpsc::UnboundedReceiver<GatewaySignal>>>,
    running: Arc<AtomicBool>,
    shutdown: Notify,
    processed: AtomicU64,
    discarded: AtomicU64,
}

impl EventLoop {
    /// Create the loop and the sender the shard connections push into
    pub fn new(state: Arc<ConnectionState>) -> (Arc<Self>, SignalSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_loop = Arc::new(Self {
            state,
            signals: Mutex::new(Some(rx)),
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Notify::new(),
            processed: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        });
        (event_loop, tx)
    }

    pub fn state(&self) -> &Arc<ConnectionState> {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signals applied so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Frames dropped because their payload did not decode
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Start the consumer task
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Event loop is already running");
            return;
        }
        let Some(receiver) = self.signals.lock().take() else {
            tracing::warn!("Event loop cannot be restarted once stopped");
            self.running.store(false, Ordering::SeqCst);
            return;
        };

        let event_loop = Arc::clone(&self);
        tokio::spawn(async move {
            event_loop.run(receiver).await;
        });

        tracing::info!("Event loop started");
    }

    /// Stop the consumer task after the signal it is currently applying
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
        tracing::info!("Event loop stopped");
    }

    async fn run(&self, mut receiver: mpsc::UnboundedReceiver<GatewaySignal>) {
        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                () = self.shutdown.notified() => break,
                signal = receiver.recv() => match signal {
                    Some(signal) => self.handle_signal(signal),
                    None => {
                        tracing::debug!("All signal senders dropped");
                        break;
                    }
                },
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!(processed = self.processed(), "Event loop ended");
    }

    fn handle_signal(&self, signal: GatewaySignal) {
        let signal = match signal {
            GatewaySignal::Frame { shard_id, message } => {
                match GatewaySignal::from_message(shard_id, message) {
                    Ok(Some(signal)) => signal,
                    Ok(None) => return,
                    Err(e) => {
                        self.discarded.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(shard_id, error = %e, "Discarding malformed event");
                        return;
                    }
                }
            }
            signal => signal,
        };

        match signal {
            GatewaySignal::Dispatch { shard_id, event } => self.state.dispatch(shard_id, event),
            GatewaySignal::Invalidated(shard_id) => self.state.invalidate(shard_id),
            GatewaySignal::Frame { .. } => return,
        }
        self.processed.fetch_add(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("running", &self.is_running())
            .field("processed", &self.processed())
            .finish_non_exhaustive()
    }
}
