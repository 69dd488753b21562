// ============================================================================
// Relay Worker Modules
// ============================================================================
//
// The single background consumer and everything that keeps it single:
// - state.rs      - NOT_STARTED -> RUNNING -> STOPPED lifecycle
// - processor.rs  - handling of one received message
// - worker.rs     - the blocking receive loop
// - runner.rs     - capacity-1 task runner the worker is launched on
// - supervisor.rs - owns the lifecycle, rejects duplicate starts
//
// ============================================================================

pub mod processor;
pub mod runner;
pub mod state;
pub mod supervisor;
pub mod worker;

pub use processor::{process_message, ProcessResult};
pub use runner::BoundedTaskRunner;
pub use state::{StopReason, WorkerLifecycle, WorkerStatus};
pub use supervisor::WorkerSupervisor;
pub use worker::ConsumerWorker;
