//! Worker process port.
//!
//! The orchestrator never touches OS processes directly: a [`Spawner`]
//! turns a [`WorkerSpec`] into a running [`WorkerProcess`] plus the
//! [`ControlChannel`] bound to it.

use serde::{Deserialize, Serialize};

use crate::domain::exit::{ExitKind, StopSignal};
use crate::domain::shard::ShardId;
use crate::error::Result;
use crate::infrastructure::config::logging::LoggingConfig;
use crate::infrastructure::config::worker::WorkerConfig;
use crate::infrastructure::pipe::ControlChannel;

/// Everything a worker needs to start: its shard assignment plus the
/// fleet-wide configuration bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub cluster_name: String,
    pub shard_ids: Vec<ShardId>,
    pub shard_count: u32,
    pub worker: WorkerConfig,
    pub logging: LoggingConfig,
}

/// A spawned worker process, exclusively owned by its cluster.
pub trait WorkerProcess: Send {
    /// OS process id, if the process has not been reaped.
    fn pid(&self) -> Option<u32>;

    /// Non-blocking liveness poll. `Ok(None)` while the process runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS status query fails.
    fn try_exit(&mut self) -> Result<Option<ExitKind>>;

    /// Deliver `signal` to the process.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::ProcessGone`](crate::error::ClusterError::ProcessGone)
    /// when the process no longer exists.
    fn signal(&mut self, signal: StopSignal) -> Result<()>;

    /// Release OS resources held for the process.
    fn release(&mut self);
}

/// A freshly spawned worker and its control channel.
pub struct SpawnedWorker {
    pub process: Box<dyn WorkerProcess>,
    pub channel: ControlChannel,
}

/// Factory for worker processes.
pub trait Spawner: Send + Sync {
    /// Spawn a worker for `spec` with a brand-new control channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    fn spawn(&self, spec: &WorkerSpec) -> Result<SpawnedWorker>;
}
