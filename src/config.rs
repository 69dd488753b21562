// ============================================================================
// Relay Configuration
// ============================================================================
//
// Loaded from environment variables (and an optional .env file).
// Broker credentials and logical resource names live here so nothing
// concrete is compiled into the binary.
//
// ============================================================================

mod broker;
mod server;
mod worker;

pub use broker::{BrokerConfig, BrokerKind};
pub use server::ServerConfig;
pub use worker::WorkerConfig;

use anyhow::Result;

/// Main configuration structure for the relay
#[derive(Clone, Debug)]
pub struct Config {
    pub broker: BrokerConfig,
    pub worker: WorkerConfig,
    pub server: ServerConfig,
    pub rust_log: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let broker = BrokerConfig::from_env()?;
        let worker = WorkerConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        Ok(Self {
            broker,
            worker,
            server,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Configuration backed by the in-process broker
    pub fn in_memory() -> Self {
        Self {
            broker: BrokerConfig::in_memory(),
            worker: WorkerConfig::default(),
            server: ServerConfig::default(),
            rust_log: "info".to_string(),
        }
    }
}
