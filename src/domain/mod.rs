//! Process-independent fleet types: shard plans, cluster names, pipe
//! commands and exit classification.

pub mod command;
pub mod exit;
pub mod name;
pub mod reply;
pub mod shard;

pub use command::{Command, CommandMessage};
pub use exit::{ExitKind, StopSignal};
pub use name::{NamePool, DEFAULT_CLUSTER_NAMES};
pub use reply::{ClusterReply, ReplyOutcome};
pub use shard::{partition, ClusterAssignment, ShardId, ShardPlan};
