//! Shard-count discovery port.

use async_trait::async_trait;

use crate::error::Result;

/// Source of the fleet's total shard count, queried once at startup.
#[async_trait]
pub trait ShardCountSource: Send + Sync {
    /// Return the total number of shards.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails. Startup aborts on failure.
    async fn shard_count(&self) -> Result<u32>;
}
