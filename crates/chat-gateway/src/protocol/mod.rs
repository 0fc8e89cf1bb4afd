//! Gateway protocol definitions
//!
//! Frame format, op codes and the command payloads the client sends.

mod messages;
mod opcodes;
mod payloads;

pub use messages::GatewayMessage;
pub use opcodes::OpCode;
pub use payloads::RequestGuildMembersPayload;
