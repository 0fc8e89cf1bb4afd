//! Outbound command seam
//!
//! The connection state only ever sends one command, Request Guild Members.
//! Whatever owns the socket implements [`GatewaySender`] to carry it.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::protocol::{GatewayMessage, RequestGuildMembersPayload};

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("shard {0} is not connected")]
    NotConnected(u32),

    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sends commands to the gateway connection of a shard
#[async_trait]
pub trait GatewaySender: Send + Sync {
    async fn send(&self, shard_id: u32, message: GatewayMessage) -> Result<(), SendError>;

    /// Send op 8 for `payload`
    async fn request_guild_members(
        &self,
        shard_id: u32,
        payload: &RequestGuildMembersPayload,
    ) -> Result<(), SendError> {
        let message = GatewayMessage::request_guild_members(payload)?;
        self.send(shard_id, message).await
    }
}

/// Sender that forwards frames into a channel, one per client
///
/// The receiving end is drained by the socket writer.
#[derive(Debug, Clone)]
pub struct ChannelSender {
    tx: mpsc::UnboundedSender<(u32, GatewayMessage)>,
}

impl ChannelSender {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(u32, GatewayMessage)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl GatewaySender for ChannelSender {
    async fn send(&self, shard_id: u32, message: GatewayMessage) -> Result<(), SendError> {
        self.tx
            .send((shard_id, message))
            .map_err(|_| SendError::NotConnected(shard_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::OpCode;
    use chat_core::Snowflake;

    #[tokio::test]
    async fn test_channel_sender_forwards_op8() {
        let (sender, mut rx) = ChannelSender::new();
        let payload = RequestGuildMembersPayload::all(Snowflake::new(5), "nonce");
        sender.request_guild_members(1, &payload).await.unwrap();

        let (shard, message) = rx.recv().await.unwrap();
        assert_eq!(shard, 1);
        assert_eq!(message.op, OpCode::RequestGuildMembers);
    }

    #[tokio::test]
    async fn test_closed_channel_reports_shard() {
        let (sender, rx) = ChannelSender::new();
        drop(rx);
        let err = sender.send(3, GatewayMessage::reconnect()).await.unwrap_err();
        assert!(matches!(err, SendError::NotConnected(3)));
    }
}
