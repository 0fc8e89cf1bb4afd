//! # chat-client
//!
//! Entry point for applications: builds the REST client, the connection
//! state and its event loop from one [`ClientConfig`](chat_common::ClientConfig)
//! and exposes typed REST calls on top of the cache.

pub mod client;
pub mod error;

pub use client::Client;
pub use error::{Error, Result};

pub use chat_common::{ClientConfig, TracingConfig};
pub use chat_gateway::{Event, GatewaySender, GatewaySignal, SignalSender};
