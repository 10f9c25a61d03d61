// ABOUTME: Runtime configuration surface for the broker: listen address and cleanup interval
// ABOUTME: No persisted state and no config files, per the specification's external interfaces

use std::net::SocketAddr;
use std::time::Duration;

/// Where the broker listens and how often it sweeps dead subscriptions.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub addr: SocketAddr,
    pub cleanup_interval: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            addr: "0.0.0.0:8080".parse().unwrap(),
            cleanup_interval: Duration::from_secs(5),
        }
    }
}

impl BrokerConfig {
    /// Build configuration from `PUBSUB_BROKER_ADDR`, falling back to
    /// `cli_addr` (typically an `argh`-parsed `--addr` flag), falling back to
    /// the hardcoded default `0.0.0.0:8080`.
    pub fn from_env(cli_addr: Option<SocketAddr>) -> Self {
        let addr = std::env::var("PUBSUB_BROKER_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(cli_addr)
            .unwrap_or_else(|| BrokerConfig::default().addr);

        BrokerConfig {
            addr,
            ..BrokerConfig::default()
        }
    }
}
