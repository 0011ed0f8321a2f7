//! Launcher state shared with the background loops.
//!
//! The active cluster set sits behind an async lock, held for a whole
//! sweep or shutdown. The channel map is separate and only ever locked
//! briefly, so the operator relay can snapshot it while a sweep is waiting
//! on a restart handshake.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard, Notify};
use tracing::debug;

use super::cluster::{Cluster, StartContext, StartOutcome};
use crate::error::Result;
use crate::infrastructure::pipe::ControlChannel;

pub struct Fleet {
    clusters: AsyncMutex<Vec<Cluster>>,
    channels: Mutex<BTreeMap<String, Arc<ControlChannel>>>,
    alive: AtomicBool,
    shutdown: Notify,
}

impl Fleet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            clusters: AsyncMutex::new(Vec::new()),
            channels: Mutex::new(BTreeMap::new()),
            alive: AtomicBool::new(true),
            shutdown: Notify::new(),
        }
    }

    /// Lock the active cluster set.
    pub async fn clusters(&self) -> MutexGuard<'_, Vec<Cluster>> {
        self.clusters.lock().await
    }

    /// Start `cluster`, keeping the channel map in step: the old channel
    /// is dropped before the spawn and the new one registered on readiness.
    ///
    /// # Errors
    ///
    /// Propagates [`Cluster::start`] failures.
    pub async fn start_cluster(
        &self,
        cluster: &mut Cluster,
        ctx: &StartContext,
        force: bool,
    ) -> Result<StartOutcome> {
        let outcome = cluster.start(ctx, force).await;
        match &outcome {
            Ok(StartOutcome::Started(channel)) => {
                self.register_channel(cluster.name(), Arc::clone(channel));
            }
            Ok(StartOutcome::AlreadyRunning) => {}
            Err(_) => self.remove_channel(cluster.name()),
        }
        outcome
    }

    pub fn register_channel(&self, name: &str, channel: Arc<ControlChannel>) {
        debug!(cluster = name, "Registering channel");
        self.channels.lock().insert(name.to_owned(), channel);
    }

    pub fn remove_channel(&self, name: &str) {
        self.channels.lock().remove(name);
    }

    /// Current channels in name order.
    #[must_use]
    pub fn channel_snapshot(&self) -> Vec<(String, Arc<ControlChannel>)> {
        self.channels
            .lock()
            .iter()
            .map(|(name, channel)| (name.clone(), Arc::clone(channel)))
            .collect()
    }

    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.lock().keys().cloned().collect()
    }

    /// Whether the liveness loop should keep running.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn mark_stopped(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Ask the launcher to shut the fleet down.
    pub fn request_shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Resolves once [`request_shutdown`](Self::request_shutdown) has been
    /// called, including before this future was created.
    pub async fn shutdown_requested(&self) {
        self.shutdown.notified().await;
    }
}

impl Default for Fleet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_request_is_remembered() {
        let fleet = Fleet::new();
        fleet.request_shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(1), fleet.shutdown_requested())
            .await
            .expect("request made before waiting is not lost");
    }

    #[test]
    fn stopping_clears_alive() {
        let fleet = Fleet::new();
        assert!(fleet.is_alive());
        fleet.mark_stopped();
        assert!(!fleet.is_alive());
    }
}
