//! Trait definitions (hexagonal ports).
//!
//! Ports are the seams between the fleet logic and the outside world:
//!
//! - [`Spawner`] / [`WorkerProcess`] - OS worker processes
//! - [`ShardCountSource`] - gateway shard-count discovery
//! - [`ShardHost`] - the application running inside a worker
//! - [`LineSource`] / [`ReplySink`] - operator console

pub mod inbound;
pub mod outbound;

pub use inbound::host::{HostContext, ShardHost};
pub use inbound::operator::{LineSource, ReplySink};
pub use outbound::shards::ShardCountSource;
pub use outbound::spawner::{SpawnedWorker, Spawner, WorkerProcess, WorkerSpec};
