//! Client facade
//!
//! Owns the REST dispatcher and the connection state. Socket handling stays
//! outside: whatever runs the shard connections pushes frames into
//! [`Client::signals`] and carries op 8 through the [`GatewaySender`] it
//! passed in.

use std::sync::Arc;

use chat_common::ClientConfig;
use chat_core::{Channel, Guild, Member, Message, PartialEmoji, Snowflake, User};
use chat_gateway::events::payloads::{
    ChannelPayload, GuildPayload, MemberPayload, MessagePayload, UserPayload,
};
use chat_gateway::{ConnectionState, Event, EventLoop, GatewaySender, SignalSender, StateSettings};
use chat_http::endpoints::BotGateway;
use chat_http::{
    CreateMessage, EditChannel, EditMember, EditMessage, EditProfile, HistoryQuery, HttpClient,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::Result;

/// Page size used when listing guild members over REST
const MEMBER_PAGE: u16 = 1000;

/// A configured client
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: Arc<HttpClient>,
    state: Arc<ConnectionState>,
    event_loop: Arc<EventLoop>,
    signals: SignalSender,
}

impl Client {
    /// Build every component and return the receiver of public events
    pub fn new(
        config: ClientConfig,
        sender: Arc<dyn GatewaySender>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Event>)> {
        let http = HttpClient::new(config.token.clone(), &config.http)?;
        let (state, events) = ConnectionState::new(StateSettings::from(&config), sender);
        let (event_loop, signals) = EventLoop::new(Arc::clone(&state));

        info!(
            shards = config.gateway.shard_count,
            intents = config.gateway.intents.bits(),
            api_base = %http.api_base(),
            "Client configured"
        );

        let client = Self {
            config: Arc::new(config),
            http: Arc::new(http),
            state,
            event_loop,
            signals,
        };
        Ok((client, events))
    }

    /// Load the configuration from the environment and build the client
    pub fn from_env(
        sender: Arc<dyn GatewaySender>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Event>)> {
        Self::new(ClientConfig::from_env()?, sender)
    }

    /// Start applying gateway signals
    pub fn start(&self) {
        Arc::clone(&self.event_loop).start();
    }

    pub fn stop(&self) {
        self.event_loop.stop();
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn state(&self) -> &Arc<ConnectionState> {
        &self.state
    }

    /// Where shard connections push their frames
    pub fn signals(&self) -> SignalSender {
        self.signals.clone()
    }

    // === Session ===

    /// Verify the token and return the account it belongs to
    pub async fn login(&self) -> Result<User> {
        let user: UserPayload = decode(self.http.login().await?)?;
        let user = user.to_user();
        info!(user_id = %user.id, username = %user.username, "Logged in");
        Ok(user)
    }

    pub async fn gateway_url(&self) -> Result<String> {
        Ok(self.http.get_gateway(self.config.gateway.compress).await?)
    }

    pub async fn bot_gateway(&self) -> Result<BotGateway> {
        Ok(self.http.get_bot_gateway(self.config.gateway.compress).await?)
    }

    // === Cache ===

    pub fn user(&self) -> Option<User> {
        self.state.current_user()
    }

    pub fn guilds(&self) -> Vec<Guild> {
        self.state.guilds()
    }

    pub fn get_guild(&self, guild_id: Snowflake) -> Option<Guild> {
        self.state.guild(guild_id)
    }

    pub fn get_channel(&self, channel_id: Snowflake) -> Option<Channel> {
        self.state.channel(channel_id)
    }

    pub fn get_user(&self, user_id: Snowflake) -> Option<User> {
        self.state.user(user_id)
    }

    pub fn get_message(&self, message_id: Snowflake) -> Option<Message> {
        self.state.message(message_id)
    }

    /// Fetch every member of a guild over the gateway
    pub async fn chunk_guild(&self, guild_id: Snowflake) -> Result<Vec<Member>> {
        Ok(self.state.chunk_guild(guild_id).await?)
    }

    // === Messages ===

    pub async fn send_message(&self, channel_id: Snowflake, message: CreateMessage) -> Result<Message> {
        to_message(self.http.send_message(channel_id, message).await?)
    }

    pub async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        edit: &EditMessage,
    ) -> Result<Message> {
        to_message(self.http.edit_message(channel_id, message_id, edit).await?)
    }

    pub async fn delete_message(&self, channel_id: Snowflake, message_id: Snowflake) -> Result<()> {
        Ok(self.http.delete_message(channel_id, message_id).await?)
    }

    /// Cached copy when present, otherwise fetched
    pub async fn fetch_message(&self, channel_id: Snowflake, message_id: Snowflake) -> Result<Message> {
        if let Some(message) = self.state.message(message_id) {
            return Ok(message);
        }
        to_message(self.http.get_message(channel_id, message_id).await?)
    }

    /// One page of history, newest first
    pub async fn history(&self, channel_id: Snowflake, query: HistoryQuery) -> Result<Vec<Message>> {
        let payloads: Vec<MessagePayload> = decode(self.http.message_history(channel_id, query).await?)?;
        Ok(payloads.iter().map(MessagePayload::to_message).collect())
    }

    pub async fn bulk_delete(&self, channel_id: Snowflake, message_ids: &[Snowflake]) -> Result<()> {
        Ok(self.http.bulk_delete_messages(channel_id, message_ids).await?)
    }

    pub async fn pins(&self, channel_id: Snowflake) -> Result<Vec<Message>> {
        let payloads: Vec<MessagePayload> = decode(self.http.pins(channel_id).await?)?;
        Ok(payloads.iter().map(MessagePayload::to_message).collect())
    }

    pub async fn add_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &PartialEmoji,
    ) -> Result<()> {
        Ok(self.http.add_reaction(channel_id, message_id, emoji).await?)
    }

    pub async fn remove_reaction(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        emoji: &PartialEmoji,
    ) -> Result<()> {
        Ok(self.http.remove_own_reaction(channel_id, message_id, emoji).await?)
    }

    pub async fn trigger_typing(&self, channel_id: Snowflake) -> Result<()> {
        Ok(self.http.trigger_typing(channel_id).await?)
    }

    // === Channels ===

    pub async fn fetch_channel(&self, channel_id: Snowflake) -> Result<Channel> {
        to_channel(self.http.get_channel(channel_id).await?)
    }

    pub async fn edit_channel(&self, channel_id: Snowflake, edit: &EditChannel) -> Result<Channel> {
        to_channel(self.http.edit_channel(channel_id, edit).await?)
    }

    pub async fn delete_channel(&self, channel_id: Snowflake) -> Result<Channel> {
        to_channel(self.http.delete_channel(channel_id).await?)
    }

    /// DM channel with a user, reusing the cached one when known
    pub async fn create_dm(&self, user_id: Snowflake) -> Result<Channel> {
        if let Some(channel) = self.state.private_channel_by_user(user_id) {
            debug!(user_id = %user_id, channel_id = %channel.id, "Reusing cached DM channel");
            return Ok(channel);
        }
        to_channel(self.http.create_dm(user_id).await?)
    }

    // === Guilds and members ===

    pub async fn fetch_guild(&self, guild_id: Snowflake) -> Result<Guild> {
        let payload: GuildPayload = decode(self.http.get_guild(guild_id, true).await?)?;
        Ok(payload.to_guild().0)
    }

    pub async fn fetch_guild_channels(&self, guild_id: Snowflake) -> Result<Vec<Channel>> {
        let payloads: Vec<ChannelPayload> = decode(self.http.guild_channels(guild_id).await?)?;
        Ok(payloads.iter().map(|c| c.to_channel(Some(guild_id))).collect())
    }

    pub async fn fetch_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Result<Member> {
        let payload: MemberPayload = decode(self.http.get_member(guild_id, user_id).await?)?;
        Ok(payload.to_member(guild_id, user_id))
    }

    /// Every member of a guild over REST, paging by user ID
    pub async fn fetch_members(&self, guild_id: Snowflake) -> Result<Vec<Member>> {
        let mut members = Vec::new();
        let mut after = None;
        loop {
            let page: Vec<MemberPayload> =
                decode(self.http.list_members(guild_id, MEMBER_PAGE, after).await?)?;
            let count = page.len();
            members.extend(page.iter().filter_map(|m| m.to_member_and_user(guild_id).map(|(member, _)| member)));
            after = members.last().map(|m: &Member| m.user_id);
            if count < usize::from(MEMBER_PAGE) || after.is_none() {
                break;
            }
        }
        debug!(guild_id = %guild_id, members = members.len(), "Fetched guild members");
        Ok(members)
    }

    pub async fn edit_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        edit: &EditMember,
    ) -> Result<Member> {
        let payload: MemberPayload = decode(self.http.edit_member(guild_id, user_id, edit).await?)?;
        Ok(payload.to_member(guild_id, user_id))
    }

    pub async fn kick(&self, guild_id: Snowflake, user_id: Snowflake) -> Result<()> {
        Ok(self.http.kick_member(guild_id, user_id).await?)
    }

    pub async fn ban(&self, guild_id: Snowflake, user_id: Snowflake, delete_message_seconds: u32) -> Result<()> {
        Ok(self.http.ban_member(guild_id, user_id, delete_message_seconds).await?)
    }

    pub async fn add_role(&self, guild_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> Result<()> {
        Ok(self.http.add_member_role(guild_id, user_id, role_id).await?)
    }

    pub async fn remove_role(&self, guild_id: Snowflake, user_id: Snowflake, role_id: Snowflake) -> Result<()> {
        Ok(self.http.remove_member_role(guild_id, user_id, role_id).await?)
    }

    pub async fn leave_guild(&self, guild_id: Snowflake) -> Result<()> {
        Ok(self.http.leave_guild(guild_id).await?)
    }

    // === Users ===

    pub async fn fetch_user(&self, user_id: Snowflake) -> Result<User> {
        let payload: UserPayload = decode(self.http.get_user(user_id).await?)?;
        Ok(payload.to_user())
    }

    pub async fn edit_profile(&self, edit: &EditProfile) -> Result<User> {
        let payload: UserPayload = decode(self.http.edit_profile(edit).await?)?;
        Ok(payload.to_user())
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

fn to_message(value: Value) -> Result<Message> {
    decode::<MessagePayload>(value).map(|m| m.to_message())
}

fn to_channel(value: Value) -> Result<Channel> {
    decode::<ChannelPayload>(value).map(|c| c.to_channel(None))
}
