// ============================================================================
// Worker Configuration
// ============================================================================

use anyhow::Result;

const DEFAULT_SENTINEL: &str = "END";
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Consumer worker specific configuration
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Payload that ends the consumer loop
    pub sentinel: String,
    /// How long shutdown waits for the worker to release its connection
    pub shutdown_grace_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

impl WorkerConfig {
    pub(crate) fn from_env() -> Result<Self> {
        let sentinel =
            std::env::var("RELAY_SENTINEL").unwrap_or_else(|_| DEFAULT_SENTINEL.to_string());
        if sentinel.is_empty() {
            anyhow::bail!("RELAY_SENTINEL must not be empty");
        }

        Ok(Self {
            sentinel,
            shutdown_grace_secs: std::env::var("RELAY_SHUTDOWN_GRACE_SECS")
                .unwrap_or_else(|_| DEFAULT_SHUTDOWN_GRACE_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
        })
    }
}
