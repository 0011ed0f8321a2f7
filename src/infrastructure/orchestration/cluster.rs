//! Orchestrator-side handle to one worker.
//!
//! A [`Cluster`] is the stable record: name and shard assignment never
//! change. The process and its control channel live in a replaceable
//! [`Incarnation`], created fresh by every start.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::command::READY;
use crate::domain::exit::{ExitKind, StopSignal};
use crate::domain::shard::ShardId;
use crate::error::{ClusterError, Error, Result};
use crate::infrastructure::config::logging::LoggingConfig;
use crate::infrastructure::config::worker::WorkerConfig;
use crate::infrastructure::pipe::ControlChannel;
use crate::port::{Spawner, WorkerProcess, WorkerSpec};

/// Fleet-wide inputs for starting any cluster.
pub struct StartContext {
    pub spawner: Arc<dyn Spawner>,
    pub worker: WorkerConfig,
    pub logging: LoggingConfig,
    /// Readiness wait bound. `None` waits forever.
    pub ready_timeout: Option<Duration>,
    pub stop_signal: StopSignal,
}

/// Result of [`Cluster::start`].
pub enum StartOutcome {
    /// A new worker signalled readiness on this channel.
    Started(Arc<ControlChannel>),
    /// A worker was already running and `force` was not set.
    AlreadyRunning,
}

/// Result of one liveness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Running,
    Exited(ExitKind),
    /// No process: never started, or the last start failed.
    Missing,
}

struct Incarnation {
    process: Box<dyn WorkerProcess>,
    channel: Arc<ControlChannel>,
    started_at: DateTime<Utc>,
}

/// Point-in-time view of a cluster, for status output and tests.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterStatus {
    pub name: String,
    pub shard_ids: Vec<ShardId>,
    pub pid: Option<u32>,
    pub starts: u32,
    pub started_at: Option<DateTime<Utc>>,
}

pub struct Cluster {
    name: String,
    shard_ids: Vec<ShardId>,
    shard_count: u32,
    current: Option<Incarnation>,
    starts: u32,
}

impl Cluster {
    #[must_use]
    pub fn new(name: impl Into<String>, shard_ids: Vec<ShardId>, shard_count: u32) -> Self {
        Self {
            name: name.into(),
            shard_ids,
            shard_count,
            current: None,
            starts: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn shard_ids(&self) -> &[ShardId] {
        &self.shard_ids
    }

    /// Spawn attempts so far, failed ones included.
    #[must_use]
    pub fn starts(&self) -> u32 {
        self.starts
    }

    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.current.as_ref().and_then(|c| c.process.pid())
    }

    #[must_use]
    pub fn channel(&self) -> Option<Arc<ControlChannel>> {
        self.current.as_ref().map(|c| Arc::clone(&c.channel))
    }

    #[must_use]
    pub fn status(&self) -> ClusterStatus {
        ClusterStatus {
            name: self.name.clone(),
            shard_ids: self.shard_ids.clone(),
            pid: self.pid(),
            starts: self.starts,
            started_at: self.current.as_ref().map(|c| c.started_at),
        }
    }

    fn spec(&self, ctx: &StartContext) -> WorkerSpec {
        WorkerSpec {
            cluster_name: self.name.clone(),
            shard_ids: self.shard_ids.clone(),
            shard_count: self.shard_count,
            worker: ctx.worker.clone(),
            logging: ctx.logging.clone(),
        }
    }

    /// Poll the current process without blocking.
    pub fn liveness(&mut self) -> Liveness {
        let Some(current) = self.current.as_mut() else {
            return Liveness::Missing;
        };
        match current.process.try_exit() {
            Ok(None) => Liveness::Running,
            Ok(Some(kind)) => Liveness::Exited(kind),
            Err(e) => {
                warn!(cluster = %self.name, error = %e, "Liveness poll failed");
                Liveness::Exited(ExitKind::Crashed { code: None })
            }
        }
    }

    /// Spawn a fresh worker and wait for its readiness message.
    ///
    /// A running worker is left alone unless `force` is set, in which case
    /// it is killed first. On failure the fresh process is killed and the
    /// cluster is left with no process.
    ///
    /// # Errors
    ///
    /// Returns an error if the spawn fails, the worker closes its pipe or
    /// sends something other than `ready` first, or the readiness wait
    /// times out.
    pub async fn start(&mut self, ctx: &StartContext, force: bool) -> Result<StartOutcome> {
        if self.liveness() == Liveness::Running {
            if !force {
                warn!(cluster = %self.name, "Cluster is already running, not starting");
                return Ok(StartOutcome::AlreadyRunning);
            }
            self.stop(StopSignal::Kill);
        }
        self.release();

        self.starts += 1;
        info!(
            cluster = %self.name,
            shards = ?self.shard_ids,
            attempt = self.starts,
            "Starting cluster"
        );

        let spawned = ctx.spawner.spawn(&self.spec(ctx))?;
        let channel = Arc::new(spawned.channel);
        let mut process = spawned.process;

        match await_ready(&self.name, &channel, ctx.ready_timeout).await {
            Ok(()) => {
                info!(cluster = %self.name, pid = ?process.pid(), "Cluster is ready");
                self.current = Some(Incarnation {
                    process,
                    channel: Arc::clone(&channel),
                    started_at: Utc::now(),
                });
                Ok(StartOutcome::Started(channel))
            }
            Err(e) => {
                if let Err(kill) = process.signal(StopSignal::Kill) {
                    debug!(cluster = %self.name, error = %kill, "Kill after failed start");
                }
                process.release();
                Err(e)
            }
        }
    }

    /// Signal the current process. Idempotent: a process that is already
    /// gone is not an error.
    pub fn stop(&mut self, signal: StopSignal) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        match current.process.signal(signal) {
            Ok(()) => info!(cluster = %self.name, %signal, "Stop signal sent"),
            Err(Error::Cluster(ClusterError::ProcessGone)) => {
                debug!(cluster = %self.name, "Process already gone");
            }
            Err(e) => warn!(cluster = %self.name, error = %e, "Failed to signal process"),
        }
    }

    /// Drop the current process and channel.
    pub fn release(&mut self) {
        if let Some(mut current) = self.current.take() {
            current.process.release();
        }
    }
}

/// Wait for the readiness message. A free function so the future never
/// borrows the non-`Sync` process handle.
async fn await_ready(
    cluster: &str,
    channel: &ControlChannel,
    limit: Option<Duration>,
) -> Result<()> {
    let first = match limit {
        Some(limit) => tokio::time::timeout(limit, channel.recv_ready())
            .await
            .map_err(|_| ClusterError::ReadyTimeout {
                cluster: cluster.to_owned(),
                secs: limit.as_secs(),
            })?,
        None => channel.recv_ready().await,
    };

    let handshake = |reason: String| -> Error {
        ClusterError::Handshake {
            cluster: cluster.to_owned(),
            reason,
        }
        .into()
    };
    match first {
        Ok(message) if message == READY => Ok(()),
        Ok(message) => Err(handshake(format!("expected \"{READY}\", got {message:?}"))),
        Err(e) => Err(handshake(e.to_string())),
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("name", &self.name)
            .field("shard_ids", &self.shard_ids)
            .field("pid", &self.pid())
            .field("starts", &self.starts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{Behavior, FakeSpawner};

    fn context(spawner: &Arc<FakeSpawner>, ready_timeout: Option<Duration>) -> StartContext {
        StartContext {
            spawner: Arc::clone(spawner) as Arc<dyn Spawner>,
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
            ready_timeout,
            stop_signal: StopSignal::Interrupt,
        }
    }

    #[tokio::test]
    async fn start_waits_for_ready() {
        let spawner = Arc::new(FakeSpawner::new());
        let ctx = context(&spawner, None);
        let mut cluster = Cluster::new("Arbok", vec![0, 1], 2);

        let outcome = cluster.start(&ctx, false).await.unwrap();
        let StartOutcome::Started(channel) = outcome else {
            panic!("expected a fresh start");
        };
        assert_eq!(channel.request("ping").await.unwrap(), "pong");
        assert_eq!(cluster.liveness(), Liveness::Running);
        assert_eq!(spawner.spawns()[0].shard_ids, vec![0, 1]);
    }

    #[tokio::test]
    async fn running_cluster_is_not_restarted_without_force() {
        let spawner = Arc::new(FakeSpawner::new());
        let ctx = context(&spawner, None);
        let mut cluster = Cluster::new("Arbok", vec![0], 1);
        cluster.start(&ctx, false).await.unwrap();

        let again = cluster.start(&ctx, false).await.unwrap();
        assert!(matches!(again, StartOutcome::AlreadyRunning));
        assert_eq!(spawner.spawn_count("Arbok"), 1);

        let forced = cluster.start(&ctx, true).await.unwrap();
        assert!(matches!(forced, StartOutcome::Started(_)));
        assert_eq!(spawner.spawn_count("Arbok"), 2);
        assert_eq!(spawner.signals("Arbok"), vec![StopSignal::Kill]);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_wait_fails_and_kills_the_worker() {
        let spawner = Arc::new(FakeSpawner::new().with_default(Behavior::Silent));
        let ctx = context(&spawner, Some(Duration::from_secs(30)));
        let mut cluster = Cluster::new("Bulbasaur", vec![4], 5);

        let result = cluster.start(&ctx, false).await;
        assert!(matches!(
            result,
            Err(Error::Cluster(ClusterError::ReadyTimeout { secs: 30, .. }))
        ));
        assert_eq!(cluster.liveness(), Liveness::Missing);
        assert_eq!(spawner.signals("Bulbasaur"), vec![StopSignal::Kill]);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let spawner = Arc::new(FakeSpawner::new());
        let ctx = context(&spawner, None);
        let mut cluster = Cluster::new("Charmander", vec![0], 1);
        cluster.start(&ctx, false).await.unwrap();

        cluster.stop(StopSignal::Interrupt);
        cluster.stop(StopSignal::Interrupt);
        assert_eq!(spawner.signals("Charmander"), vec![StopSignal::Interrupt]);
        assert_eq!(cluster.liveness(), Liveness::Exited(ExitKind::Clean));

        cluster.release();
        cluster.stop(StopSignal::Interrupt);
        assert_eq!(cluster.liveness(), Liveness::Missing);
    }
}
