// ============================================================================
// Worker Supervisor
// ============================================================================
//
// Owns the one consumer worker the process is allowed to have. `start`
// moves the lifecycle to RUNNING before anything is submitted, so a second
// `start` is rejected by the lifecycle itself rather than by the runner's
// queue. A stopped worker is never restarted.
//
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::runner::BoundedTaskRunner;
use super::state::{StopReason, WorkerLifecycle, WorkerStatus};
use super::worker::ConsumerWorker;
use crate::config::WorkerConfig;
use crate::error::RelayResult;
use crate::resolver::{FactoryHandle, QueueHandle};
use crate::result_log::ResultLog;

pub struct WorkerSupervisor {
    runner: BoundedTaskRunner,
    lifecycle: Arc<WorkerLifecycle>,
    cancel: CancellationToken,
    factory: Arc<FactoryHandle>,
    queue: Arc<QueueHandle>,
    log: Arc<ResultLog>,
    sentinel: String,
}

impl WorkerSupervisor {
    pub fn new(
        factory: Arc<FactoryHandle>,
        queue: Arc<QueueHandle>,
        log: Arc<ResultLog>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            runner: BoundedTaskRunner::new("relay-consumer"),
            lifecycle: Arc::new(WorkerLifecycle::new()),
            cancel: CancellationToken::new(),
            factory,
            queue,
            log,
            sentinel: config.sentinel.clone(),
        }
    }

    /// Launch the consumer worker
    ///
    /// Fails with `Capacity` if a worker was already started, running or not.
    pub fn start(&self) -> RelayResult<()> {
        self.lifecycle.begin()?;

        let worker = ConsumerWorker {
            factory: self.factory.clone(),
            queue: self.queue.clone(),
            log: self.log.clone(),
            sentinel: self.sentinel.clone(),
            lifecycle: self.lifecycle.clone(),
            cancel: self.cancel.clone(),
        };

        if let Err(e) = self.runner.submit(worker.run()) {
            self.lifecycle.stop(StopReason::Failed(e.to_string()));
            return Err(e);
        }

        info!(
            factory = %self.factory.name(),
            destination = %self.queue.name(),
            "Consumer worker started"
        );
        Ok(())
    }

    pub fn status(&self) -> WorkerStatus {
        self.lifecycle.status()
    }

    /// Token the worker races its blocking receive against
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait until the worker reports STOPPED
    ///
    /// Never resolves if the worker was not started.
    pub async fn wait_stopped(&self) -> StopReason {
        self.lifecycle.wait_stopped().await
    }

    /// Cancel the worker and wait up to `grace` for it to release its
    /// connection
    ///
    /// Returns `None` if the worker was never started or did not stop in time.
    pub async fn shutdown(&self, grace: Duration) -> Option<StopReason> {
        self.cancel.cancel();

        if self.status() == WorkerStatus::NotStarted {
            return None;
        }

        match tokio::time::timeout(grace, self.wait_stopped()).await {
            Ok(reason) => Some(reason),
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "Consumer worker did not stop within grace period"
                );
                None
            }
        }
    }
}
