//! Outbound ports (driven side): worker processes and shard discovery.

pub mod shards;
pub mod spawner;
