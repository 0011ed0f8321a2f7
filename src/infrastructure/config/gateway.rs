//! Gateway-info endpoint configuration.

use std::time::Duration;

use serde::Deserialize;

/// Gateway configuration used for shard-count discovery.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Gateway-info endpoint returning the recommended shard count.
    #[serde(default = "default_url")]
    pub url: String,
    /// User agent sent with the discovery request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds (default: 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "https://discord.com/api/v10/gateway/bot".into()
}

fn default_user_agent() -> String {
    concat!("DiscordBot (shardline, ", env!("CARGO_PKG_VERSION"), ")").into()
}

const fn default_timeout_secs() -> u64 {
    10
}

impl GatewayConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
