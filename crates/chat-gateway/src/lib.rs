//! # chat-gateway
//!
//! Gateway side of the client: wire frames and opcodes, typed dispatch
//! events, and the connection state that folds them into the entity cache
//! and publishes [`Event`]s.

pub mod event_loop;
pub mod events;
pub mod protocol;
pub mod sender;
pub mod state;

pub use event_loop::{EventLoop, GatewaySignal, SignalSender};
pub use events::{DecodeError, GatewayEvent, GatewayEventType};
pub use protocol::{GatewayMessage, OpCode, RequestGuildMembersPayload};
pub use sender::{ChannelSender, GatewaySender, SendError};
pub use state::{ConnectionState, Event, StateSettings};
