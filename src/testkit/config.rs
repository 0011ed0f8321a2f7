//! Canonical test configurations.

use crate::infrastructure::config::fleet::{FleetConfig, RelayConfig};
use crate::infrastructure::config::settings::Config;

/// Fleet of `shard_count` shards in groups of `per_cluster`, with a fixed
/// count (no discovery), one-second polling and one-second reply timeout.
#[must_use]
pub fn fleet(shard_count: u32, per_cluster: usize) -> Config {
    Config {
        fleet: FleetConfig {
            shards_per_cluster: per_cluster,
            poll_interval_secs: 1,
            shard_count: Some(shard_count),
            ..FleetConfig::default()
        },
        relay: RelayConfig {
            reply_timeout_secs: 1,
            ..RelayConfig::default()
        },
        ..Config::default()
    }
}
