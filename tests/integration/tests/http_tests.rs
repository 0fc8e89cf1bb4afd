//! REST dispatcher integration tests
//!
//! Every test runs against a local mock of the API with scripted
//! responses.
//!
//! Run with: cargo test -p integration-tests --test http_tests

use std::time::Duration;

use chat_client::Client;
use chat_core::Snowflake;
use chat_gateway::ChannelSender;
use chat_http::{CreateMessage, HttpError};
use integration_tests::{fixtures::*, init_tracing, MockApi, MockResponse};
use serde_json::json;
use std::sync::Arc;

fn client(api: &MockApi) -> Client {
    let (sender, _commands) = ChannelSender::new();
    let (client, _events) = Client::new(api.config(), Arc::new(sender)).expect("client");
    client
}

// ============================================================================
// Entities
// ============================================================================

#[tokio::test]
async fn test_login_and_send_message() {
    init_tracing();
    let api = MockApi::start().await.expect("mock api");
    api.script([
        MockResponse::json(200, &user_json(SELF_ID)),
        MockResponse::json(200, &message_json(500, 20, None, SELF_ID)),
    ]);
    let client = client(&api);

    let me = client.login().await.unwrap();
    assert_eq!(me.id, Snowflake::new(SELF_ID));

    let message = client
        .send_message(Snowflake::new(20), CreateMessage::content("hi"))
        .await
        .unwrap();
    assert_eq!(message.id, Snowflake::new(500));

    let requests = api.requests();
    assert_eq!(requests[0].path, "/api/v10/users/@me");
    assert_eq!(requests[1].method, "POST");
    assert_eq!(requests[1].path, "/api/v10/channels/20/messages");
}

#[tokio::test]
async fn test_fetch_members_single_page() {
    let api = MockApi::start().await.expect("mock api");
    api.script([MockResponse::json(200, &json!([member_json(2), member_json(3)]))]);
    let client = client(&api);

    let members = client.fetch_members(Snowflake::new(100)).await.unwrap();
    let ids: Vec<u64> = members.iter().map(|m| m.user_id.get()).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(api.request_count(), 1);
}

#[tokio::test]
async fn test_unexpected_body_is_a_payload_error() {
    let api = MockApi::start().await.expect("mock api");
    api.script([MockResponse::json(200, &json!({"nope": true}))]);
    let client = client(&api);

    let err = client.fetch_user(Snowflake::new(2)).await.unwrap_err();
    assert!(matches!(err, chat_client::Error::Payload(_)));
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn test_login_rejects_bad_token() {
    let api = MockApi::start().await.expect("mock api");
    api.script([MockResponse::json(401, &json!({"code": 0, "message": "401: Unauthorized"}))]);
    let client = client(&api);

    let err = client.login().await.unwrap_err();
    assert!(matches!(err, chat_client::Error::Http(HttpError::Unauthorized)));
}

#[tokio::test]
async fn test_status_mapping() {
    let api = MockApi::start().await.expect("mock api");
    api.script([
        MockResponse::json(403, &json!({"code": 50013, "message": "Missing Permissions"})),
        MockResponse::json(404, &json!({"code": 10003, "message": "Unknown Channel"})),
        MockResponse::json(
            400,
            &json!({
                "code": 50035,
                "message": "Invalid Form Body",
                "errors": {"content": {"_errors": [{"code": "BASE_TYPE_MAX_LENGTH", "message": "Too long"}]}}
            }),
        ),
    ]);
    let http = api.http_client().unwrap();
    let channel = Snowflake::new(5);

    let err = http.get_channel(channel).await.unwrap_err();
    assert!(matches!(err, HttpError::Forbidden(ref e) if e.code == 50013));

    let err = http.get_channel(channel).await.unwrap_err();
    assert!(matches!(err, HttpError::NotFound(ref e) if e.code == 10003));

    let err = http.get_channel(channel).await.unwrap_err();
    let HttpError::Http { status, error } = err else {
        panic!("expected a plain HTTP error, got {err:?}");
    };
    assert_eq!(status, 400);
    assert!(error.errors.iter().any(|line| line.starts_with("content") && line.contains("Too long")));
}

// ============================================================================
// Rate limits
// ============================================================================

#[tokio::test]
async fn test_exhausted_bucket_delays_next_request() {
    let api = MockApi::start().await.expect("mock api");
    api.script([
        MockResponse::json(200, &dm_json(5, 2)).bucket("abc", 0, 0.3),
        MockResponse::json(200, &dm_json(5, 2)).bucket("abc", 4, 0.3),
    ]);
    let http = api.http_client().unwrap();

    http.get_channel(Snowflake::new(5)).await.unwrap();
    http.get_channel(Snowflake::new(5)).await.unwrap();

    let requests = api.requests();
    let gap = requests[1].at.duration_since(requests[0].at);
    assert!(gap >= Duration::from_millis(250), "second request after {gap:?}");
}

#[tokio::test]
async fn test_marked_429_is_retried_without_using_an_attempt() {
    let api = MockApi::start().await.expect("mock api");
    let mut script = vec![MockResponse::rate_limited(0.05, false); 5];
    script.push(MockResponse::json(200, &dm_json(5, 2)));
    api.script(script);
    let http = api.http_client().unwrap();

    http.get_channel(Snowflake::new(5)).await.unwrap();
    assert_eq!(api.request_count(), 6);
}

#[tokio::test]
async fn test_unmarked_429_is_not_retried() {
    let api = MockApi::start().await.expect("mock api");
    api.script([
        MockResponse::text(429, "error code: 1015").header("retry-after", "30"),
        MockResponse::json(200, &dm_json(5, 2)),
    ]);
    let http = api.http_client().unwrap();

    let err = http.get_channel(Snowflake::new(5)).await.unwrap_err();
    assert!(matches!(err, HttpError::RateLimited { .. }));
    assert_eq!(api.request_count(), 1);
}

#[tokio::test]
async fn test_global_429_pauses_every_route() {
    let api = MockApi::start().await.expect("mock api");
    api.script([
        MockResponse::rate_limited(0.2, true),
        MockResponse::json(200, &dm_json(5, 2)),
        MockResponse::json(200, &user_json(2)),
    ]);
    let http = api.http_client().unwrap();

    http.get_channel(Snowflake::new(5)).await.unwrap();
    http.get_user(Snowflake::new(2)).await.unwrap();

    let requests = api.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[1].at.duration_since(requests[0].at) >= Duration::from_millis(150));
    assert!(!http.global_cooldown().is_active());
}

// ============================================================================
// Server errors
// ============================================================================

#[tokio::test]
async fn test_server_errors_are_retried() {
    let api = MockApi::start().await.expect("mock api");
    api.script([
        MockResponse::text(500, "oops"),
        MockResponse::text(502, "bad gateway"),
        MockResponse::json(200, &dm_json(5, 2)),
    ]);
    let http = api.http_client().unwrap();

    http.get_channel(Snowflake::new(5)).await.unwrap();

    let requests = api.requests();
    assert_eq!(requests.len(), 3);
    // 1 unit, then 3 units of 10ms
    assert!(requests[1].at.duration_since(requests[0].at) >= Duration::from_millis(10));
    assert!(requests[2].at.duration_since(requests[1].at) >= Duration::from_millis(30));
}

#[tokio::test]
async fn test_server_errors_give_up_after_max_attempts() {
    let api = MockApi::start().await.expect("mock api");
    api.script(vec![MockResponse::text(504, "timeout"); 6]);
    let http = api.http_client().unwrap();

    let err = http.get_channel(Snowflake::new(5)).await.unwrap_err();
    assert_eq!(err.status(), Some(504));
    assert_eq!(api.request_count(), 5);
}

#[tokio::test]
async fn test_service_unavailable_is_not_retried() {
    let api = MockApi::start().await.expect("mock api");
    api.script([MockResponse::text(503, "unavailable")]);
    let http = api.http_client().unwrap();

    let err = http.get_channel(Snowflake::new(5)).await.unwrap_err();
    assert!(matches!(err, HttpError::ServerError { status: 503, .. }));
    assert_eq!(api.request_count(), 1);
}
