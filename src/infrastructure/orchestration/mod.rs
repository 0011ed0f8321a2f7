//! Fleet orchestration.
//!
//! The [`Launcher`] owns the fleet; the liveness loop and the operator
//! relay run as background tasks over the shared [`Fleet`] state.

pub mod cluster;
pub mod fleet;
pub mod launcher;
pub mod rebooter;
pub mod relay;

pub use cluster::{Cluster, ClusterStatus, Liveness, StartContext, StartOutcome};
pub use fleet::Fleet;
pub use launcher::Launcher;
pub use rebooter::SweepReport;
pub use relay::Console;
