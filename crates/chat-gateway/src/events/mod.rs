//! Gateway events
//!
//! Event names, wire payloads, decoding into [`GatewayEvent`] and
//! conversion of payloads into cached entities.

mod convert;
mod event;
mod event_types;
pub mod payloads;

pub use convert::parse_timestamp;
pub use event::{DecodeError, GatewayEvent};
pub use event_types::GatewayEventType;
