use crate::config::Config;
use crate::producer::MessageProducer;
use crate::relay_worker::WorkerSupervisor;
use crate::resolver::{FactoryHandle, QueueHandle, ResourceResolver};
use crate::result_log::ResultLog;
use std::sync::Arc;

/// Application context containing shared dependencies
///
/// The producer and the worker share the same lazy handles, so each logical
/// name is resolved once for the whole process.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub producer: MessageProducer,
    pub result_log: Arc<ResultLog>,
    pub supervisor: Arc<WorkerSupervisor>,
    /// Used by the health check to open a fresh ping connection
    pub factory: Arc<FactoryHandle>,
}

impl AppContext {
    /// Creates a new application context; the worker is not started
    pub fn new(config: Arc<Config>, resolver: Arc<dyn ResourceResolver>) -> Self {
        let factory: Arc<FactoryHandle> = Arc::new(FactoryHandle::new(
            config.broker.connection_factory_name.clone(),
            resolver.clone(),
        ));
        let queue: Arc<QueueHandle> = Arc::new(QueueHandle::new(
            config.broker.destination_name.clone(),
            resolver,
        ));
        let result_log = Arc::new(ResultLog::new());

        let producer = MessageProducer::new(factory.clone(), queue.clone());
        let supervisor = Arc::new(WorkerSupervisor::new(
            factory.clone(),
            queue,
            result_log.clone(),
            &config.worker,
        ));

        Self {
            config,
            producer,
            result_log,
            supervisor,
            factory,
        }
    }
}
