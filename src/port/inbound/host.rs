//! Worker host port.
//!
//! A [`ShardHost`] is what runs inside a worker: the gateway connection and
//! everything built on it. The command loop only needs to start it, reload
//! its extensions, read its live state and close it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Live key/value view of a worker, readable from `eval` snippets.
pub type HostContext = BTreeMap<String, Value>;

#[async_trait]
pub trait ShardHost: Send {
    /// Connect the assigned shards and run post-init setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot start. The worker exits non-zero.
    async fn init(&mut self) -> Result<()>;

    /// Reinitialize extension modules and re-run post-init setup.
    ///
    /// # Errors
    ///
    /// Returns an error if any extension fails to reload.
    async fn reload(&mut self) -> Result<()>;

    /// Snapshot of the live context.
    fn context(&self) -> HostContext;

    /// Close the gateway connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection does not close cleanly.
    async fn close(&mut self) -> Result<()>;
}
