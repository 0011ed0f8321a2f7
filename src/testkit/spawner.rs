//! In-memory worker processes.
//!
//! [`FakeSpawner`] wires each "process" to a duplex pipe whose far end runs
//! the real worker entrypoint over a [`StaticHost`], or misbehaves as
//! scripted by a [`Behavior`]. Exits are injected with
//! [`FakeSpawner::exit`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{duplex, split};
use tokio::task::JoinHandle;

use super::host::StaticHost;
use crate::domain::command::READY;
use crate::domain::exit::{ExitKind, StopSignal};
use crate::domain::shard::ShardId;
use crate::error::{ClusterError, Result};
use crate::infrastructure::pipe::{ControlChannel, WorkerEndpoint};
use crate::infrastructure::worker::run_worker;
use crate::port::{SpawnedWorker, Spawner, WorkerProcess, WorkerSpec};

const PIPE_CAPACITY: usize = 16 * 1024;

/// How a fake worker behaves on its pipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behavior {
    /// Signals readiness and answers every command.
    #[default]
    Responsive,
    /// Never signals readiness.
    Silent,
    /// Signals readiness, then reads commands without ever replying.
    Mute,
    /// Like `Responsive`, but `reloadall` fails.
    FailingReload,
}

/// One call to [`Spawner::spawn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRecord {
    pub cluster: String,
    pub shard_ids: Vec<ShardId>,
    pub shard_count: u32,
}

#[derive(Debug, Default)]
struct ProcState {
    exit: Option<ExitKind>,
    task: Option<JoinHandle<()>>,
}

impl ProcState {
    fn terminate(&mut self, kind: ExitKind) {
        self.exit.get_or_insert(kind);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[derive(Default)]
pub struct FakeSpawner {
    default: Behavior,
    behaviors: Mutex<HashMap<String, Behavior>>,
    spawns: Mutex<Vec<SpawnRecord>>,
    current: Mutex<HashMap<String, Arc<Mutex<ProcState>>>>,
    signals: SignalLog,
    next_pid: AtomicU32,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behavior for clusters without an explicit one.
    pub fn with_default(mut self, behavior: Behavior) -> Self {
        self.default = behavior;
        self
    }

    /// Behavior for future spawns of `cluster`.
    pub fn set_behavior(&self, cluster: &str, behavior: Behavior) {
        self.behaviors.lock().insert(cluster.to_owned(), behavior);
    }

    /// Make the current process of `cluster` exit as `kind`. Its pipe closes.
    pub fn exit(&self, cluster: &str, kind: ExitKind) {
        if let Some(state) = self.current.lock().get(cluster) {
            state.lock().terminate(kind);
        }
    }

    pub fn spawns(&self) -> Vec<SpawnRecord> {
        self.spawns.lock().clone()
    }

    pub fn spawn_count(&self, cluster: &str) -> usize {
        self.spawns.lock().iter().filter(|s| s.cluster == cluster).count()
    }

    /// Every signal delivered to any process of `cluster`, in order.
    pub fn signals(&self, cluster: &str) -> Vec<StopSignal> {
        self.signals.0.lock().get(cluster).cloned().unwrap_or_default()
    }

    fn behavior(&self, cluster: &str) -> Behavior {
        self.behaviors
            .lock()
            .get(cluster)
            .copied()
            .unwrap_or(self.default)
    }
}

impl Spawner for FakeSpawner {
    fn spawn(&self, spec: &WorkerSpec) -> Result<SpawnedWorker> {
        let cluster = spec.cluster_name.clone();
        self.spawns.lock().push(SpawnRecord {
            cluster: cluster.clone(),
            shard_ids: spec.shard_ids.clone(),
            shard_count: spec.shard_count,
        });

        let (ours, theirs) = duplex(PIPE_CAPACITY);
        let (read, write) = split(ours);
        let channel = ControlChannel::from_io(cluster.clone(), read, write);
        let (read, write) = split(theirs);
        let endpoint = WorkerEndpoint::from_io(read, write);

        let state = Arc::new(Mutex::new(ProcState::default()));
        let task = spawn_worker(
            cluster.clone(),
            self.behavior(&cluster),
            endpoint,
            spec.worker.allow_eval,
            Arc::clone(&state),
        );
        state.lock().task = Some(task);
        self.current.lock().insert(cluster.clone(), Arc::clone(&state));

        let pid = 10_000 + self.next_pid.fetch_add(1, Ordering::SeqCst);
        let process = FakeProcess {
            cluster,
            pid,
            state,
            log: self.signals.clone(),
        };
        Ok(SpawnedWorker {
            process: Box::new(process),
            channel,
        })
    }
}

/// Signals delivered per cluster, shared with every [`FakeProcess`].
#[derive(Debug, Clone, Default)]
struct SignalLog(Arc<Mutex<HashMap<String, Vec<StopSignal>>>>);

/// Process handle returned by [`FakeSpawner`].
#[derive(Debug)]
pub struct FakeProcess {
    cluster: String,
    pid: u32,
    state: Arc<Mutex<ProcState>>,
    log: SignalLog,
}

impl WorkerProcess for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn try_exit(&mut self) -> Result<Option<ExitKind>> {
        Ok(self.state.lock().exit)
    }

    /// Interrupt and terminate exit cleanly, kill exits with no code.
    fn signal(&mut self, signal: StopSignal) -> Result<()> {
        let mut state = self.state.lock();
        if state.exit.is_some() {
            return Err(ClusterError::ProcessGone.into());
        }
        self.log
            .0
            .lock()
            .entry(self.cluster.clone())
            .or_default()
            .push(signal);
        state.terminate(match signal {
            StopSignal::Interrupt | StopSignal::Terminate => ExitKind::Clean,
            StopSignal::Kill => ExitKind::Crashed { code: None },
        });
        Ok(())
    }

    fn release(&mut self) {}
}

fn spawn_worker(
    cluster: String,
    behavior: Behavior,
    mut endpoint: WorkerEndpoint,
    allow_eval: bool,
    state: Arc<Mutex<ProcState>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match behavior {
            Behavior::Responsive | Behavior::FailingReload => {
                let mut host = StaticHost::new().with_value("cluster", cluster.as_str());
                if behavior == Behavior::FailingReload {
                    host = host.failing_reload();
                }
                let stop = std::future::pending::<()>();
                if run_worker(&cluster, host, endpoint, allow_eval, stop)
                    .await
                    .is_err()
                {
                    // Pipe closed from the orchestrator side.
                    state.lock().exit.get_or_insert(ExitKind::Crashed { code: Some(1) });
                }
            }
            Behavior::Silent => {
                let _endpoint = endpoint;
                std::future::pending::<()>().await;
            }
            Behavior::Mute => {
                if endpoint.send(READY).await.is_err() {
                    return;
                }
                while let Ok(Some(_)) = endpoint.recv().await {}
            }
        }
    })
}
