// ============================================================================
// Consumer Worker
// ============================================================================
//
// Opens one connection and session for its whole life, creates a single
// consumer on the relay queue and drains it:
//
//   receive (no timeout) -> process -> repeat until sentinel
//
// Exit paths and what they do:
// - sentinel           -> STOPPED(Sentinel)
// - cancellation token -> STOPPED(Cancelled)
// - transport error    -> STOPPED(Failed), no reconnect
// - malformed frame    -> logged, loop continues
//
// The session is closed on every exit path before the lifecycle reports
// STOPPED.
//
// ============================================================================

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::processor::{process_message, ProcessResult};
use super::state::{StopReason, WorkerLifecycle};
use crate::broker::{QueueConsumer, Session};
use crate::error::RelayError;
use crate::metrics;
use crate::resolver::{FactoryHandle, QueueHandle};
use crate::result_log::ResultLog;

/// One run of the background consumer; consumed by [`ConsumerWorker::run`]
pub struct ConsumerWorker {
    pub(crate) factory: Arc<FactoryHandle>,
    pub(crate) queue: Arc<QueueHandle>,
    pub(crate) log: Arc<ResultLog>,
    pub(crate) sentinel: String,
    pub(crate) lifecycle: Arc<WorkerLifecycle>,
    pub(crate) cancel: CancellationToken,
}

impl ConsumerWorker {
    /// Drain the queue until a stop condition, then report STOPPED
    ///
    /// A panic inside the loop still reports STOPPED(Failed).
    pub async fn run(self) {
        let mut guard = StopGuard {
            lifecycle: self.lifecycle.clone(),
            reason: None,
        };

        let reason = self.consume().await;
        match &reason {
            StopReason::Failed(detail) => {
                error!(error = %detail, "Consumer worker stopped after failure")
            }
            other => info!(reason = %other, "Consumer worker stopped"),
        }
        guard.reason = Some(reason);
    }

    async fn consume(&self) -> StopReason {
        let (factory, queue) = match (self.factory.resolve(), self.queue.resolve()) {
            (Ok(factory), Ok(queue)) => (factory, queue),
            (Err(e), _) | (_, Err(e)) => return StopReason::Failed(e.to_string()),
        };

        let mut session = match Session::open(factory.as_ref()).await {
            Ok(session) => session,
            Err(e) => return StopReason::Failed(e.to_string()),
        };

        info!(
            broker = %factory.describe(),
            queue = %queue,
            "Consumer connected, waiting for messages"
        );

        let reason = {
            let mut consumer = session.create_consumer(&queue);
            self.drain(&mut consumer).await
        };

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close consumer session");
        }
        info!(queue = %queue, "Consumer connection released");

        reason
    }

    async fn drain(&self, consumer: &mut QueueConsumer<'_>) -> StopReason {
        loop {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return StopReason::Cancelled,
                received = consumer.receive() => received,
            };

            match received {
                Ok(message) => {
                    if process_message(&self.log, &self.sentinel, message).await
                        == ProcessResult::Sentinel
                    {
                        return StopReason::Sentinel;
                    }
                }
                Err(RelayError::MalformedMessage(detail)) => {
                    metrics::MESSAGES_MALFORMED_TOTAL.inc();
                    warn!(
                        error = %detail,
                        queue = %consumer.queue(),
                        "Skipping undecodable frame"
                    );
                }
                Err(e) => {
                    error!(error = %e, queue = %consumer.queue(), "Error in receiver");
                    return StopReason::Failed(e.to_string());
                }
            }
        }
    }
}

/// Reports STOPPED when the worker future ends, including by unwinding
struct StopGuard {
    lifecycle: Arc<WorkerLifecycle>,
    reason: Option<StopReason>,
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        let reason = match self.reason.take() {
            Some(reason) => reason,
            None => {
                error!("Consumer worker ended without a stop reason");
                StopReason::Failed("consumer worker panicked".to_string())
            }
        };
        self.lifecycle.stop(reason);
    }
}
