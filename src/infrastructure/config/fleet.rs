//! Fleet partitioning and supervision configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::domain::exit::StopSignal;

/// Fleet configuration.
///
/// Controls how shards are grouped into clusters and how the liveness
/// loop supervises worker processes.
#[derive(Debug, Clone, Deserialize)]
pub struct FleetConfig {
    /// Maximum shards assigned to one cluster (default: 4).
    #[serde(default = "default_shards_per_cluster")]
    pub shards_per_cluster: usize,
    /// Liveness polling interval in seconds (default: 5).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Upper bound on the readiness handshake. Unbounded when unset.
    #[serde(default)]
    pub ready_timeout_secs: Option<u64>,
    /// Fixed shard count. Skips gateway discovery when set.
    #[serde(default)]
    pub shard_count: Option<u32>,
    /// Replacement for the default cluster name pool.
    #[serde(default)]
    pub cluster_names: Option<Vec<String>>,
    /// Signal sent to workers on stop.
    #[serde(default)]
    pub stop_signal: StopSignal,
}

const fn default_shards_per_cluster() -> usize {
    4
}

const fn default_poll_interval_secs() -> u64 {
    5
}

impl FleetConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            shards_per_cluster: default_shards_per_cluster(),
            poll_interval_secs: default_poll_interval_secs(),
            ready_timeout_secs: None,
            shard_count: None,
            cluster_names: None,
            stop_signal: StopSignal::default(),
        }
    }
}

/// Operator command relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Read operator commands from stdin (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Per-cluster reply timeout in seconds (default: 5).
    #[serde(default = "default_reply_timeout_secs")]
    pub reply_timeout_secs: u64,
    /// Prompt printed before each operator line.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

const fn default_true() -> bool {
    true
}

const fn default_reply_timeout_secs() -> u64 {
    5
}

fn default_prompt() -> String {
    "$ ".into()
}

impl RelayConfig {
    #[must_use]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            reply_timeout_secs: default_reply_timeout_secs(),
            prompt: default_prompt(),
        }
    }
}
