use serde::Serialize;
use tracing::warn;

use crate::error::RelayResult;
use crate::relay_worker::WorkerStatus;
use crate::resolver::FactoryHandle;

/// Snapshot reported by `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub broker: BrokerHealth,
    pub worker: WorkerStatus,
    pub received_lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrokerHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    /// Healthy means the broker answered; a stopped worker is reported but
    /// does not fail the check
    pub fn is_healthy(&self) -> bool {
        self.broker.reachable
    }
}

/// Ping the broker over a short-lived connection
pub async fn check_broker(factory: &FactoryHandle) -> BrokerHealth {
    match ping(factory).await {
        Ok(target) => BrokerHealth {
            reachable: true,
            target: Some(target),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "Broker health check failed");
            BrokerHealth {
                reachable: false,
                target: None,
                error: Some(e.user_message()),
            }
        }
    }
}

async fn ping(factory: &FactoryHandle) -> RelayResult<String> {
    let factory = factory.resolve()?;
    let mut connection = factory.create_connection().await?;
    let pinged = connection.ping().await;
    if let Err(e) = connection.close().await {
        warn!(error = %e, "Failed to close health check connection");
    }
    pinged.map(|_| factory.describe())
}
