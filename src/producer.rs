use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::broker::Session;
use crate::error::RelayResult;
use crate::message::TextMessage;
use crate::metrics;
use crate::resolver::{FactoryHandle, QueueHandle};

/// Sends text messages to the relay queue
///
/// Every `send` opens its own connection and session and releases both
/// before returning, whether or not the send succeeded. Nothing is pooled.
#[derive(Clone)]
pub struct MessageProducer {
    factory: Arc<FactoryHandle>,
    queue: Arc<QueueHandle>,
}

impl MessageProducer {
    pub fn new(factory: Arc<FactoryHandle>, queue: Arc<QueueHandle>) -> Self {
        Self { factory, queue }
    }

    /// Enqueue one text message carrying `payload`
    ///
    /// # Errors
    /// * `Binding` - the factory or destination name is unresolved
    /// * `Transport` - connecting or publishing failed
    pub async fn send(&self, payload: &str) -> RelayResult<()> {
        debug!(payload = %payload, "Sending payload");

        let start = Instant::now();
        let result = self.send_once(payload).await;
        let latency = start.elapsed();

        match &result {
            Ok(()) => {
                metrics::MESSAGES_SENT_TOTAL.inc();
                metrics::SEND_LATENCY.observe(latency.as_secs_f64());
                info!(
                    queue = %self.queue.name(),
                    latency_ms = latency.as_millis(),
                    "Message sent"
                );
            }
            Err(e) => {
                metrics::MESSAGES_SEND_FAILURE_TOTAL.inc();
                error!(
                    error = %e,
                    queue = %self.queue.name(),
                    latency_ms = latency.as_millis(),
                    "Failed to send message"
                );
            }
        }

        result
    }

    async fn send_once(&self, payload: &str) -> RelayResult<()> {
        let factory = self.factory.resolve()?;
        let queue = self.queue.resolve()?;

        let mut session = Session::open(factory.as_ref()).await?;
        let sent = session
            .create_producer(&queue)
            .send(TextMessage::new(payload))
            .await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close producer session");
        }

        sent
    }
}
