//! Top-level fleet coordinator.
//!
//! Lifecycle: [`Launcher::new`] → [`Launcher::run`] (discover, partition,
//! start clusters one at a time, then supervise) → [`Launcher::shutdown`].

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::cluster::{Cluster, ClusterStatus, StartContext, StartOutcome};
use super::fleet::Fleet;
use super::rebooter::{self, SweepReport};
use super::relay::{self, Console};
use crate::domain::name::NamePool;
use crate::domain::reply::ClusterReply;
use crate::domain::shard::ShardPlan;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{LineSource, ReplySink, ShardCountSource, Spawner};

pub struct Launcher {
    fleet: Arc<Fleet>,
    ctx: Arc<StartContext>,
    discovery: Arc<dyn ShardCountSource>,
    names: NamePool,
    per_cluster: usize,
    poll_interval: Duration,
    reply_timeout: Duration,
    queue: VecDeque<Cluster>,
    plan: Option<ShardPlan>,
    keep_alive: Option<JoinHandle<()>>,
    relay: Option<JoinHandle<()>>,
}

impl Launcher {
    #[must_use]
    pub fn new(
        config: &Config,
        spawner: Arc<dyn Spawner>,
        discovery: Arc<dyn ShardCountSource>,
    ) -> Self {
        let ctx = StartContext {
            spawner,
            worker: config.worker.clone(),
            logging: config.logging.clone(),
            ready_timeout: config.fleet.ready_timeout(),
            stop_signal: config.fleet.stop_signal,
        };
        Self {
            fleet: Arc::new(Fleet::new()),
            ctx: Arc::new(ctx),
            discovery,
            names: config.name_pool(),
            per_cluster: config.fleet.shards_per_cluster,
            poll_interval: config.fleet.poll_interval(),
            reply_timeout: config.relay.reply_timeout(),
            queue: VecDeque::new(),
            plan: None,
            keep_alive: None,
            relay: None,
        }
    }

    #[must_use]
    pub fn fleet(&self) -> &Arc<Fleet> {
        &self.fleet
    }

    #[must_use]
    pub fn plan(&self) -> Option<&ShardPlan> {
        self.plan.as_ref()
    }

    /// Discover the shard count, partition it and queue one cluster per group.
    ///
    /// # Errors
    ///
    /// Fails if discovery fails or the plan cannot be built. Nothing has
    /// been spawned at that point.
    pub async fn prepare(&mut self) -> Result<&ShardPlan> {
        let shard_count = self.discovery.shard_count().await?;
        let names = std::mem::take(&mut self.names);
        let plan = ShardPlan::build(shard_count, self.per_cluster, names)?;
        info!(
            shards = shard_count,
            clusters = plan.clusters.len(),
            "Preparing clusters"
        );

        self.queue = plan
            .clusters
            .iter()
            .map(|c| Cluster::new(c.name.clone(), c.shard_ids.clone(), shard_count))
            .collect();
        Ok(self.plan.insert(plan))
    }

    /// Start queued clusters strictly one at a time.
    ///
    /// A cluster that fails to start still joins the active set; the
    /// liveness loop retries it.
    pub async fn start_clusters(&mut self) {
        while let Some(mut cluster) = self.queue.pop_front() {
            match self.fleet.start_cluster(&mut cluster, &self.ctx, false).await {
                Ok(StartOutcome::Started(_) | StartOutcome::AlreadyRunning) => {}
                Err(e) => error!(cluster = %cluster.name(), error = %e, "Cluster failed to start"),
            }
            self.fleet.clusters().await.push(cluster);
        }
        let active = self.fleet.clusters().await.len();
        info!(clusters = active, "All clusters launched");
    }

    /// Start the supervised liveness loop.
    pub fn spawn_rebooter(&mut self) {
        self.keep_alive = Some(rebooter::supervise(
            Arc::clone(&self.fleet),
            Arc::clone(&self.ctx),
            self.poll_interval,
        ));
    }

    /// Start relaying operator lines from `console`.
    pub fn spawn_relay<S, R>(&mut self, console: Console<S, R>)
    where
        S: LineSource + 'static,
        R: ReplySink + 'static,
    {
        let fleet = Arc::clone(&self.fleet);
        let timeout = self.reply_timeout;
        self.relay = Some(tokio::spawn(relay::operator_loop(fleet, console, timeout)));
    }

    /// Run one liveness sweep now.
    pub async fn sweep(&self) -> SweepReport {
        rebooter::sweep(&self.fleet, &self.ctx).await
    }

    /// Broadcast `command` to every active cluster.
    pub async fn broadcast(&self, command: &str) -> Vec<ClusterReply> {
        let mut discard = |_: &ClusterReply| {};
        relay::broadcast(
            self.fleet.channel_snapshot(),
            command,
            self.reply_timeout,
            &mut discard,
        )
        .await
    }

    pub async fn active_clusters(&self) -> Vec<ClusterStatus> {
        self.fleet.clusters().await.iter().map(Cluster::status).collect()
    }

    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        self.fleet.channel_names()
    }

    /// Stop the loops and signal every active cluster.
    ///
    /// Does not wait for workers to exit.
    pub async fn shutdown(&mut self) {
        info!("Shutting down");
        self.fleet.mark_stopped();

        if let Some(handle) = self.keep_alive.take() {
            handle.abort();
            // Releases the cluster lock if a sweep was mid-restart.
            let _ = handle.await;
        }
        if let Some(handle) = self.relay.take() {
            handle.abort();
        }

        let mut clusters = self.fleet.clusters().await;
        for cluster in clusters.iter_mut() {
            cluster.stop(self.ctx.stop_signal);
        }
        info!(clusters = clusters.len(), "Stop signals sent");
    }

    async fn startup(&mut self) -> Result<()> {
        self.prepare().await?;
        self.start_clusters().await;
        Ok(())
    }

    /// Full orchestrator run.
    ///
    /// Returns after `interrupt` resolves or the fleet empties, with every
    /// remaining worker signalled.
    ///
    /// # Errors
    ///
    /// Returns startup errors (discovery, planning).
    pub async fn run<S, R, F>(&mut self, console: Option<Console<S, R>>, interrupt: F) -> Result<()>
    where
        S: LineSource + 'static,
        R: ReplySink + 'static,
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        let started = tokio::select! {
            result = self.startup() => Some(result),
            () = &mut interrupt => None,
        };
        match started {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                self.shutdown().await;
                return Err(e);
            }
            None => {
                warn!("Interrupted during startup");
                self.shutdown().await;
                return Ok(());
            }
        }

        self.spawn_rebooter();
        if let Some(console) = console {
            self.spawn_relay(console);
        }

        let fleet = Arc::clone(&self.fleet);
        tokio::select! {
            () = &mut interrupt => info!("Interrupt received"),
            () = fleet.shutdown_requested() => info!("Fleet shutdown requested"),
        }
        self.shutdown().await;
        Ok(())
    }
}
