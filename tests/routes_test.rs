// ============================================================================
// HTTP Routes Tests
// ============================================================================
//
// Drives the axum router directly with tower's `oneshot`; no socket is bound.
//
// ============================================================================

mod test_utils;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use construct_relay::resolver::StaticResolver;
use construct_relay::routes::create_router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use test_utils::{TestRelay, relay_with_resolver, spawn_relay};
use tower::ServiceExt;

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, body.to_vec())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response body should be JSON")
}

#[tokio::test]
async fn test_send_returns_sent() {
    let relay = spawn_relay();
    let app = create_router(relay.context.clone());

    let (status, _, body) = get(app, "/send?payload=hello").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({ "status": "sent" }));
}

#[tokio::test]
async fn test_send_without_payload_is_rejected() {
    let relay = TestRelay::started();

    let (status, _, _) = get(create_router(relay.context.clone()), "/send").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A valid send after the rejected one is the first and only line
    let (status, _, _) = get(create_router(relay.context.clone()), "/send?payload=next").await;
    assert_eq!(status, StatusCode::OK);
    relay.wait_for_lines(1).await;
    assert_eq!(relay.context.result_log.snapshot().await, "next\n");

    relay.context.supervisor.shutdown(test_utils::WAIT).await;
}

#[tokio::test]
async fn test_send_without_payload_enqueues_nothing() {
    let relay = TestRelay::started();

    let (status, _, _) = get(create_router(relay.context.clone()), "/send?other=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(relay.context.result_log.line_count().await, 0);

    relay.context.supervisor.shutdown(test_utils::WAIT).await;
}

#[tokio::test]
async fn test_send_then_read() {
    let relay = TestRelay::started();

    for payload in ["first", "hello%20world"] {
        let uri = format!("/send?payload={}", payload);
        let (status, _, _) = get(create_router(relay.context.clone()), &uri).await;
        assert_eq!(status, StatusCode::OK);
    }
    relay.wait_for_lines(2).await;

    let (status, content_type, body) = get(create_router(relay.context.clone()), "/read").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert_eq!(String::from_utf8(body).unwrap(), "first\nhello world\n");

    relay.context.supervisor.shutdown(test_utils::WAIT).await;
}

#[tokio::test]
async fn test_read_before_any_message_is_empty() {
    let relay = spawn_relay();
    let (status, _, body) = get(create_router(relay.context.clone()), "/read").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_send_with_broker_down_is_bad_gateway() {
    let relay = spawn_relay();
    relay.broker.shut_down();

    let (status, _, body) = get(create_router(relay.context.clone()), "/send?payload=x").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let body = json(&body);
    assert_eq!(body["error_code"], "TRANSPORT_ERROR");
    assert_eq!(body["status"], 502);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_send_with_unbound_names_is_server_error() {
    let context = relay_with_resolver(Arc::new(StaticResolver::new()));

    let (status, _, body) = get(create_router(context), "/send?payload=x").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let body = json(&body);
    assert_eq!(body["error_code"], "BINDING_ERROR");
    // Resolver detail stays in the logs
    assert!(!body["error"].as_str().unwrap().contains("jms/myrabbit"));
}

#[tokio::test]
async fn test_health_reports_worker_and_broker() {
    let relay = TestRelay::started();

    let (status, _, body) = get(create_router(relay.context.clone()), "/health").await;
    assert_eq!(status, StatusCode::OK);

    let body = json(&body);
    assert_eq!(body["broker"]["reachable"], true);
    assert_eq!(body["worker"]["state"], "running");
    assert_eq!(body["received_lines"], 0);

    relay.context.supervisor.shutdown(test_utils::WAIT).await;
}

#[tokio::test]
async fn test_health_after_sentinel() {
    let relay = TestRelay::started();
    relay.context.producer.send("END").await.unwrap();
    relay.wait_stopped().await;

    let (status, _, body) = get(create_router(relay.context.clone()), "/health").await;
    assert_eq!(status, StatusCode::OK);

    let body = json(&body);
    assert_eq!(body["worker"]["state"], "stopped");
    assert_eq!(body["worker"]["stop"]["reason"], "sentinel");
    assert_eq!(body["received_lines"], 1);
}

#[tokio::test]
async fn test_health_with_broker_down_is_unavailable() {
    let relay = spawn_relay();
    relay.broker.shut_down();

    let (status, _, body) = get(create_router(relay.context.clone()), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(&body)["broker"]["reachable"], false);
}

#[tokio::test]
async fn test_metrics_exposes_relay_counters() {
    let relay = spawn_relay();
    relay.context.producer.send("counted").await.unwrap();

    let (status, content_type, body) = get(create_router(relay.context.clone()), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert!(String::from_utf8(body).unwrap().contains("relay_messages_sent_total"));
}
