//! Connection state integration tests
//!
//! Dispatch frames go through the client's event loop exactly as a shard
//! connection would push them.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use chat_client::{Event, GatewaySignal};
use chat_common::ClientConfig;
use chat_core::Snowflake;
use integration_tests::{fixtures::*, init_tracing, GatewaySession, MockApi};

fn config() -> ClientConfig {
    ClientConfig::new("test-token")
}

fn is_guild_event(event: &Event) -> bool {
    matches!(event, Event::GuildAvailable(_) | Event::GuildJoin(_))
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::test]
async fn test_ready_guild_becomes_available_once() {
    init_tracing();
    let mut session = GatewaySession::start(config()).unwrap();

    session.dispatch("READY", ready_json(&[100], None));
    session.dispatch("GUILD_CREATE", guild_json(100, &[SELF_ID, 2], 2));

    let event = session.next_event().await.unwrap();
    let Event::GuildAvailable(guild) = event else {
        panic!("expected GuildAvailable, got {event:?}");
    };
    assert_eq!(guild.id, Snowflake::new(100));
    assert!(!guild.unavailable);

    assert!(matches!(session.next_event().await.unwrap(), Event::ShardReady(0)));
    assert!(matches!(session.next_event().await.unwrap(), Event::Ready));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(session.drain().iter().all(|e| !is_guild_event(e)));
    assert_eq!(session.client.guilds().len(), 1);
    assert_eq!(session.client.user().unwrap().id, Snowflake::new(SELF_ID));
}

#[tokio::test]
async fn test_guild_after_ready_is_a_join() {
    let mut session = GatewaySession::start(config()).unwrap();
    session.dispatch("READY", ready_json(&[], None));
    session.wait_for(|e| matches!(e, Event::Ready)).await.unwrap();

    session.dispatch("GUILD_CREATE", guild_json(200, &[SELF_ID], 1));
    let event = session.wait_for(is_guild_event).await.unwrap();
    assert!(matches!(event, Event::GuildJoin(ref g) if g.id == Snowflake::new(200)));
}

#[tokio::test]
async fn test_large_guild_is_chunked_before_available() {
    let mut session = GatewaySession::start(config()).unwrap();
    session.dispatch("READY", ready_json(&[100], None));
    session.dispatch("GUILD_CREATE", guild_json(100, &[SELF_ID], 300));

    let (shard_id, nonce) = session.next_chunk_request().await.unwrap();
    assert_eq!(shard_id, 0);

    session.dispatch("GUILD_MEMBERS_CHUNK", chunk_json(100, &[2, 3], 0, 3, &nonce));
    session.dispatch("GUILD_MEMBERS_CHUNK", chunk_json(100, &[4], 1, 3, &nonce));
    session.dispatch("GUILD_MEMBERS_CHUNK", chunk_json(100, &[5, 6], 2, 3, &nonce));

    let event = session.wait_for(is_guild_event).await.unwrap();
    let Event::GuildAvailable(guild) = event else {
        panic!("expected GuildAvailable, got {event:?}");
    };
    assert!(guild.is_chunked());
    assert_eq!(guild.members().count(), 6);
    assert_eq!(session.client.state().pending_chunk_requests(), 0);
}

#[tokio::test]
async fn test_ready_waits_for_every_shard() {
    let mut cfg = config();
    cfg.gateway.shard_count = 2;
    let mut session = GatewaySession::start(cfg).unwrap();

    session.dispatch_on(0, "READY", ready_json(&[], Some([0, 2])));
    assert!(matches!(session.next_event().await.unwrap(), Event::ShardReady(0)));

    session.dispatch_on(1, "READY", ready_json(&[], Some([1, 2])));
    assert!(matches!(session.next_event().await.unwrap(), Event::ShardReady(1)));
    assert!(matches!(session.next_event().await.unwrap(), Event::Ready));
}

// ============================================================================
// Member chunking
// ============================================================================

#[tokio::test]
async fn test_chunk_guild_resolves_with_members_in_order() {
    let mut session = GatewaySession::start(config()).unwrap();
    session.dispatch("READY", ready_json(&[], None));
    session.wait_for(|e| matches!(e, Event::Ready)).await.unwrap();
    session.dispatch("GUILD_CREATE", guild_json(100, &[SELF_ID], 1));
    session.wait_for(is_guild_event).await.unwrap();

    let client = session.client.clone();
    let pending = tokio::spawn(async move { client.chunk_guild(Snowflake::new(100)).await });

    let (_, nonce) = session.next_chunk_request().await.unwrap();
    session.dispatch("GUILD_MEMBERS_CHUNK", chunk_json(100, &[7, 8], 0, 3, &nonce));
    session.dispatch("GUILD_MEMBERS_CHUNK", chunk_json(100, &[9], 1, 3, &nonce));
    session.dispatch("GUILD_MEMBERS_CHUNK", chunk_json(100, &[10], 2, 3, &nonce));

    let members = pending.await.unwrap().unwrap();
    let ids: Vec<u64> = members.iter().map(|m| m.user_id.get()).collect();
    assert_eq!(ids, vec![7, 8, 9, 10]);
    assert!(session.client.state().member(Snowflake::new(100), Snowflake::new(9)).is_some());
}

#[tokio::test]
async fn test_invalidation_cancels_pending_chunks() {
    let mut session = GatewaySession::start(config()).unwrap();
    session.dispatch("READY", ready_json(&[], None));
    session.wait_for(|e| matches!(e, Event::Ready)).await.unwrap();

    let client = session.client.clone();
    let pending = tokio::spawn(async move { client.chunk_guild(Snowflake::new(100)).await });
    let (_, nonce) = session.next_chunk_request().await.unwrap();
    session.dispatch("GUILD_MEMBERS_CHUNK", chunk_json(100, &[7], 0, 2, &nonce));

    session.client.signals().send(GatewaySignal::Invalidated(0)).unwrap();
    session
        .wait_for(|e| matches!(e, Event::SessionInvalidated(0)))
        .await
        .unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, chat_client::Error::Chunk(ref e) if e.partial().len() == 1));
    assert!(session.client.guilds().is_empty());
}

// ============================================================================
// Cache bounds
// ============================================================================

#[tokio::test]
async fn test_private_channels_keep_most_recent() {
    let mut session = GatewaySession::start(config()).unwrap();
    session.dispatch("READY", ready_json(&[], None));
    session.wait_for(|e| matches!(e, Event::Ready)).await.unwrap();

    for i in 0..150 {
        session.dispatch("CHANNEL_CREATE", dm_json(10_000 + i, 20_000 + i));
    }
    for _ in 0..150 {
        session
            .wait_for(|e| matches!(e, Event::ChannelCreate(_)))
            .await
            .unwrap();
    }

    let cached = session.client.state().with_cache(|c| c.private_channels().len());
    assert_eq!(cached, 128);
    assert!(session.client.get_channel(Snowflake::new(10_000)).is_none());
    assert!(session.client.get_channel(Snowflake::new(10_021)).is_none());
    assert!(session.client.get_channel(Snowflake::new(10_022)).is_some());
    assert!(session.client.get_channel(Snowflake::new(10_149)).is_some());
}

#[tokio::test]
async fn test_message_cache_keeps_newest() {
    let mut cfg = config();
    cfg.cache.max_messages = Some(3);
    let mut session = GatewaySession::start(cfg).unwrap();
    session.dispatch("READY", ready_json(&[], None));
    session.wait_for(|e| matches!(e, Event::Ready)).await.unwrap();
    session.dispatch("GUILD_CREATE", guild_json(100, &[SELF_ID], 1));
    session.wait_for(is_guild_event).await.unwrap();

    for id in 1..=5 {
        session.dispatch("MESSAGE_CREATE", message_json(id, 1000, Some(100), 2));
    }
    for _ in 0..5 {
        session.wait_for(|e| matches!(e, Event::Message(_))).await.unwrap();
    }

    for id in 1..=2 {
        assert!(session.client.get_message(Snowflake::new(id)).is_none());
    }
    for id in 3..=5 {
        assert!(session.client.get_message(Snowflake::new(id)).is_some());
    }
    let channel = session.client.get_channel(Snowflake::new(1000)).unwrap();
    assert_eq!(channel.last_message_id, Some(Snowflake::new(5)));
}

// ============================================================================
// Facade
// ============================================================================

#[tokio::test]
async fn test_create_dm_reuses_cached_channel() {
    let api = MockApi::start().await.expect("mock api");
    let mut session = GatewaySession::start(api.config()).unwrap();
    session.dispatch("READY", ready_json(&[], None));
    session.wait_for(|e| matches!(e, Event::Ready)).await.unwrap();

    session.dispatch("CHANNEL_CREATE", dm_json(300, 2));
    session
        .wait_for(|e| matches!(e, Event::ChannelCreate(_)))
        .await
        .unwrap();

    let channel = session.client.create_dm(Snowflake::new(2)).await.unwrap();
    assert_eq!(channel.id, Snowflake::new(300));
    assert_eq!(api.request_count(), 0);
}

#[tokio::test]
async fn test_malformed_frame_does_not_stop_the_loop() {
    let mut session = GatewaySession::start(config()).unwrap();
    session.dispatch("READY", ready_json(&[], None));
    session.wait_for(|e| matches!(e, Event::Ready)).await.unwrap();

    session.dispatch("MESSAGE_CREATE", serde_json::json!({"id": "not a number"}));
    session.dispatch("CHANNEL_CREATE", dm_json(300, 2));

    let event = session.next_event().await.unwrap();
    assert!(matches!(event, Event::ChannelCreate(ref c) if c.id == Snowflake::new(300)));
}
