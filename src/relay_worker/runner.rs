// ============================================================================
// Bounded Task Runner
// ============================================================================
//
// Pool size 1, queue capacity 1. Admission and execution are two separate
// semaphores: a submission must take one of POOL_SIZE + QUEUE_CAPACITY
// admission permits or it is rejected outright; admitted tasks then wait
// for the single execution permit. Both permits are owned by the spawned
// task and released when it finishes (or panics).
//
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{RelayError, RelayResult};

pub struct BoundedTaskRunner {
    name: String,
    admission: Arc<Semaphore>,
    execution: Arc<Semaphore>,
}

impl BoundedTaskRunner {
    pub const POOL_SIZE: usize = 1;
    pub const QUEUE_CAPACITY: usize = 1;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admission: Arc::new(Semaphore::new(Self::POOL_SIZE + Self::QUEUE_CAPACITY)),
            execution: Arc::new(Semaphore::new(Self::POOL_SIZE)),
        }
    }

    /// Run `task` now, or queue it behind the running one
    ///
    /// Fails with `Capacity` when a task is running and another is queued.
    /// Must be called from within a tokio runtime.
    pub fn submit<F>(&self, task: F) -> RelayResult<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let admitted = self.admission.clone().try_acquire_owned().map_err(|_| {
            RelayError::capacity(format!(
                "task runner '{}' is full ({} running, {} queued)",
                self.name,
                Self::POOL_SIZE,
                Self::QUEUE_CAPACITY
            ))
        })?;

        let execution = self.execution.clone();
        let name = self.name.clone();
        Ok(tokio::spawn(async move {
            let _admitted = admitted;
            let _running = match execution.acquire_owned().await {
                Ok(permit) => permit,
                // Semaphore is never closed
                Err(_) => return,
            };
            debug!(runner = %name, "Task started");
            task.await;
            debug!(runner = %name, "Task finished");
        }))
    }

    /// Submissions that would currently be accepted
    pub fn available_slots(&self) -> usize {
        self.admission.available_permits()
    }
}
