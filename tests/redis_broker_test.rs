// ============================================================================
// Redis Broker Integration Tests
// ============================================================================
//
// These tests require a Redis instance (local or test container).
//
// Run with: cargo test --test redis_broker_test -- --ignored
// (Tests are marked with #[ignore] to skip unless Redis is available)
//
// ============================================================================

use construct_relay::broker::{ConnectionFactory, Queue, RedisConnectionFactory};
use construct_relay::config::{BrokerConfig, BrokerKind, Config};
use construct_relay::context::AppContext;
use construct_relay::error::RelayError;
use construct_relay::message::{Message, TextMessage};
use construct_relay::relay_worker::StopReason;
use construct_relay::resolver::ConfigResolver;
use redis::AsyncCommands;
use serial_test::serial;
use std::env;
use std::sync::Arc;
use std::time::Duration;

const TEST_PREFIX: &str = "test_relay_queue:";

fn test_broker_config(queue_name: &str) -> BrokerConfig {
    BrokerConfig {
        kind: BrokerKind::Redis,
        url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
        queue_name: queue_name.to_string(),
        queue_key_prefix: TEST_PREFIX.to_string(),
        connection_factory_name: "jms/myrabbit".to_string(),
        destination_name: "jms/test_queue".to_string(),
    }
}

async fn clear_queue(config: &BrokerConfig) {
    let client = redis::Client::open(config.url.as_str()).expect("Failed to create Redis client");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect to Redis");
    let key = format!("{}{}", config.queue_key_prefix, config.queue_name);
    let _: () = conn.del(&key).await.expect("Failed to clear test queue");
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_frames_survive_across_connections() {
    let config = test_broker_config("fifo");
    clear_queue(&config).await;

    let factory = RedisConnectionFactory::new(&config).unwrap();
    let queue = Queue::new("fifo");

    let mut producer = factory.create_connection().await.unwrap();
    for payload in ["a", "b", "c"] {
        producer
            .publish(&queue, TextMessage::new(payload).into())
            .await
            .unwrap();
    }
    producer.close().await.unwrap();

    let mut consumer = factory.create_connection().await.unwrap();
    for expected in ["a", "b", "c"] {
        let frame = consumer.receive(&queue).await.unwrap();
        let text = Message::from(frame).into_text().unwrap();
        assert_eq!(text.text(), expected);
    }
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_undecodable_entry_is_malformed() {
    let config = test_broker_config("garbage");
    clear_queue(&config).await;

    let client = redis::Client::open(config.url.as_str()).unwrap();
    let mut raw = client.get_multiplexed_async_connection().await.unwrap();
    let _: () = raw
        .lpush(format!("{}garbage", TEST_PREFIX), b"not msgpack".to_vec())
        .await
        .unwrap();

    let factory = RedisConnectionFactory::new(&config).unwrap();
    let mut consumer = factory.create_connection().await.unwrap();
    let err = consumer.receive(&Queue::new("garbage")).await.unwrap_err();
    assert!(matches!(err, RelayError::MalformedMessage(_)));
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_relay_end_to_end_over_redis() {
    let broker = test_broker_config("end_to_end");
    clear_queue(&broker).await;

    let mut config = Config::in_memory();
    config.broker = broker;
    let config = Arc::new(config);
    let resolver = Arc::new(ConfigResolver::new(config.broker.clone()));
    let context = AppContext::new(config, resolver);

    context.supervisor.start().unwrap();
    for payload in ["Hello 1", "Hello 2", "END"] {
        context.producer.send(payload).await.unwrap();
    }

    let reason = tokio::time::timeout(Duration::from_secs(5), context.supervisor.wait_stopped())
        .await
        .expect("worker should stop after the sentinel");
    assert_eq!(reason, StopReason::Sentinel);
    assert_eq!(
        context.result_log.snapshot().await,
        "Hello 1\nHello 2\nEND\n"
    );
}
