// ============================================================================
// Worker Lifecycle
// ============================================================================
//
// NOT_STARTED -> RUNNING -> STOPPED, each edge taken at most once.
// The status lives in a watch channel so the shutdown path and tests can
// wait for STOPPED without polling.
//
// ============================================================================

use serde::Serialize;
use std::fmt;
use tokio::sync::watch;

use crate::error::{RelayError, RelayResult};

/// Why the worker left RUNNING
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    /// The sentinel payload was received
    Sentinel,
    /// The cancellation token fired
    Cancelled,
    /// Resolution or transport failure; not retried
    Failed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Sentinel => write!(f, "sentinel received"),
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::Failed(detail) => write!(f, "failed: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkerStatus {
    NotStarted,
    Running,
    Stopped { stop: StopReason },
}

impl WorkerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, WorkerStatus::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, WorkerStatus::Stopped { .. })
    }
}

/// Shared lifecycle of one worker instance
pub struct WorkerLifecycle {
    status: watch::Sender<WorkerStatus>,
}

impl Default for WorkerLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerLifecycle {
    pub fn new() -> Self {
        let (status, _) = watch::channel(WorkerStatus::NotStarted);
        Self { status }
    }

    pub fn status(&self) -> WorkerStatus {
        self.status.borrow().clone()
    }

    /// NOT_STARTED -> RUNNING
    ///
    /// Fails with `Capacity` from any other state: a worker runs once.
    pub fn begin(&self) -> RelayResult<()> {
        let mut previous = None;
        let started = self.status.send_if_modified(|status| {
            if *status == WorkerStatus::NotStarted {
                *status = WorkerStatus::Running;
                true
            } else {
                previous = Some(status.clone());
                false
            }
        });

        if started {
            Ok(())
        } else {
            Err(RelayError::capacity(format!(
                "consumer worker already {}",
                match previous {
                    Some(WorkerStatus::Running) => "running".to_string(),
                    Some(WorkerStatus::Stopped { stop }) => format!("stopped ({})", stop),
                    _ => "started".to_string(),
                }
            )))
        }
    }

    /// RUNNING -> STOPPED; ignored from any other state
    pub fn stop(&self, reason: StopReason) {
        let mut reason = Some(reason);
        self.status.send_if_modified(|status| match reason.take() {
            Some(stop) if status.is_running() => {
                *status = WorkerStatus::Stopped { stop };
                true
            }
            _ => false,
        });
    }

    /// Resolve once the worker is STOPPED
    pub async fn wait_stopped(&self) -> StopReason {
        let mut receiver = self.status.subscribe();
        loop {
            let current = receiver.borrow_and_update().clone();
            if let WorkerStatus::Stopped { stop } = current {
                return stop;
            }
            if receiver.changed().await.is_err() {
                // Sender lives in self, so this only happens during teardown
                return StopReason::Cancelled;
            }
        }
    }
}
