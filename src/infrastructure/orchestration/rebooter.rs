//! Liveness polling and automatic restarts.
//!
//! Each sweep polls every active cluster once:
//!
//! - **Crash** (non-zero exit): restarted in place, same name and shards,
//!   fresh channel. The restart is awaited before the next cluster.
//! - **Clean exit** (zero): stopped, released and evicted. Never restarted.
//! - **No process** (a failed start): started again.
//!
//! An empty active set means the whole fleet is dead and triggers shutdown.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::cluster::{Liveness, StartContext};
use super::fleet::Fleet;
use crate::domain::exit::ExitKind;

/// What one sweep did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub restarted: Vec<String>,
    /// Restarts attempted that did not reach readiness.
    pub failed: Vec<String>,
    pub evicted: Vec<String>,
    pub fleet_empty: bool,
}

/// Poll every active cluster once and act on the dead ones.
pub async fn sweep(fleet: &Fleet, ctx: &StartContext) -> SweepReport {
    let mut report = SweepReport::default();
    let mut clusters = fleet.clusters().await;
    if clusters.is_empty() {
        report.fleet_empty = true;
        return report;
    }

    for cluster in clusters.iter_mut() {
        match cluster.liveness() {
            Liveness::Running => continue,
            Liveness::Exited(ExitKind::Clean) => {
                info!(cluster = %cluster.name(), exit_code = 0, "Cluster exited cleanly, removing");
                cluster.stop(ctx.stop_signal);
                cluster.release();
                fleet.remove_channel(cluster.name());
                report.evicted.push(cluster.name().to_owned());
                continue;
            }
            Liveness::Exited(kind) => {
                warn!(cluster = %cluster.name(), exit_code = %kind, "Cluster crashed, restarting");
            }
            Liveness::Missing => {
                info!(cluster = %cluster.name(), "Cluster has no process, starting");
            }
        }

        match fleet.start_cluster(cluster, ctx, false).await {
            Ok(_) => report.restarted.push(cluster.name().to_owned()),
            Err(e) => {
                error!(cluster = %cluster.name(), error = %e, "Restart failed");
                report.failed.push(cluster.name().to_owned());
            }
        }
    }

    if !report.evicted.is_empty() {
        clusters.retain(|c| !report.evicted.iter().any(|name| name == c.name()));
    }
    report.fleet_empty = clusters.is_empty();
    report
}

/// Sweep every `interval` until the fleet is stopped or found empty.
pub async fn reboot_loop(fleet: Arc<Fleet>, ctx: Arc<StartContext>, interval: Duration) {
    debug!(interval_secs = interval.as_secs(), "Reboot loop started");
    while fleet.is_alive() {
        tokio::time::sleep(interval).await;
        if !fleet.is_alive() {
            break;
        }

        let report = sweep(&fleet, &ctx).await;
        if report.fleet_empty {
            warn!("All clusters appear to be dead");
            fleet.request_shutdown();
            break;
        }
    }
}

/// Run [`reboot_loop`] in a task that relaunches it after a panic.
pub fn supervise(fleet: Arc<Fleet>, ctx: Arc<StartContext>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let run = reboot_loop(Arc::clone(&fleet), Arc::clone(&ctx), interval);
            match AssertUnwindSafe(run).catch_unwind().await {
                Ok(()) => break,
                Err(panic) => {
                    error!(error = %panic_message(panic.as_ref()), "Reboot loop failed, relaunching");
                    if !fleet.is_alive() {
                        break;
                    }
                }
            }
        }
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".into()
    }
}
