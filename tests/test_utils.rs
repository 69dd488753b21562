#![allow(dead_code)]

use construct_relay::{
    broker::InMemoryBroker,
    config::Config,
    context::AppContext,
    relay_worker::StopReason,
    resolver::{ConfigResolver, ResourceResolver},
};
use std::sync::Arc;
use std::time::Duration;

pub const WAIT: Duration = Duration::from_secs(5);

pub struct TestRelay {
    pub context: Arc<AppContext>,
    pub broker: InMemoryBroker,
}

/// Relay wired to a fresh in-process broker; the worker is not started
pub fn spawn_relay() -> TestRelay {
    let config = Arc::new(Config::in_memory());
    let resolver = ConfigResolver::new(config.broker.clone());
    let broker = resolver
        .memory_broker()
        .cloned()
        .expect("memory:// config should create an in-process broker");
    let context = Arc::new(AppContext::new(config, Arc::new(resolver)));
    TestRelay { context, broker }
}

/// Relay whose resolver is supplied by the test
pub fn relay_with_resolver(resolver: Arc<dyn ResourceResolver>) -> Arc<AppContext> {
    Arc::new(AppContext::new(Arc::new(Config::in_memory()), resolver))
}

impl TestRelay {
    pub fn started() -> Self {
        let relay = spawn_relay();
        relay
            .context
            .supervisor
            .start()
            .expect("worker should start");
        relay
    }

    pub async fn wait_stopped(&self) -> StopReason {
        tokio::time::timeout(WAIT, self.context.supervisor.wait_stopped())
            .await
            .expect("worker should stop in time")
    }

    pub async fn wait_for_lines(&self, count: usize) {
        let log = self.context.result_log.clone();
        tokio::time::timeout(WAIT, async move {
            while log.line_count().await < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("worker should receive messages in time");
    }
}
