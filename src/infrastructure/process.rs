//! OS worker processes.
//!
//! Workers are this same executable re-run with the hidden `worker`
//! subcommand. The spawn bundle travels in the [`WORKER_SPEC_ENV`]
//! environment variable so credentials stay off the argument list. The
//! worker's stdin and stdout become its control pipe; stderr is inherited.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::domain::exit::{ExitKind, StopSignal};
use crate::error::{ClusterError, Result};
use crate::infrastructure::pipe::ControlChannel;
use crate::port::{SpawnedWorker, Spawner, WorkerProcess, WorkerSpec};

/// Environment variable carrying the JSON-encoded [`WorkerSpec`].
pub const WORKER_SPEC_ENV: &str = "SHARDLINE_WORKER";

/// Spawns workers as child processes.
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessSpawner {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Spawner re-running the current executable as `<exe> worker`.
    ///
    /// # Errors
    ///
    /// Returns an error if the current executable path is unavailable.
    pub fn current_exe() -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?, vec!["worker".into()]))
    }
}

impl Spawner for ProcessSpawner {
    fn spawn(&self, spec: &WorkerSpec) -> Result<SpawnedWorker> {
        let bundle = serde_json::to_string(spec)?;
        let spawn_error = |source: std::io::Error| ClusterError::Spawn {
            cluster: spec.cluster_name.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(WORKER_SPEC_ENV, bundle)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_error)?;

        let missing = |what: &str| {
            spawn_error(std::io::Error::other(format!("worker {what} was not piped")))
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;

        debug!(cluster = %spec.cluster_name, pid = ?child.id(), "Worker spawned");

        Ok(SpawnedWorker {
            process: Box::new(ChildProcess { child: Some(child) }),
            channel: ControlChannel::from_io(spec.cluster_name.clone(), stdout, stdin),
        })
    }
}

/// A worker child process.
#[derive(Debug)]
pub struct ChildProcess {
    child: Option<Child>,
}

impl WorkerProcess for ChildProcess {
    fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    fn try_exit(&mut self) -> Result<Option<ExitKind>> {
        let Some(child) = self.child.as_mut() else {
            return Ok(Some(ExitKind::Crashed { code: None }));
        };
        Ok(child.try_wait()?.map(ExitKind::from_status))
    }

    #[cfg(unix)]
    fn signal(&mut self, signal: StopSignal) -> Result<()> {
        let pid = self.pid().ok_or(ClusterError::ProcessGone)?;
        let pid = libc::pid_t::try_from(pid).map_err(|_| ClusterError::ProcessGone)?;
        // SAFETY: kill(2) has no memory-safety preconditions.
        let rc = unsafe { libc::kill(pid, signal.as_raw()) };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Err(ClusterError::ProcessGone.into());
        }
        Err(err.into())
    }

    #[cfg(not(unix))]
    fn signal(&mut self, _signal: StopSignal) -> Result<()> {
        let child = self.child.as_mut().ok_or(ClusterError::ProcessGone)?;
        if child.id().is_none() {
            return Err(ClusterError::ProcessGone.into());
        }
        child.start_kill()?;
        Ok(())
    }

    fn release(&mut self) {
        self.child = None;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::infrastructure::config::logging::LoggingConfig;
    use crate::infrastructure::config::worker::WorkerConfig;

    fn spec() -> WorkerSpec {
        WorkerSpec {
            cluster_name: "Arbok".into(),
            shard_ids: vec![0, 1],
            shard_count: 2,
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    async fn wait_exit(process: &mut dyn WorkerProcess) -> ExitKind {
        for _ in 0..200 {
            if let Some(kind) = process.try_exit().unwrap() {
                return kind;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("process did not exit");
    }

    #[tokio::test]
    async fn classifies_exit_codes() {
        let clean = ProcessSpawner::new("sh", vec!["-c".into(), "exit 0".into()]);
        let mut worker = clean.spawn(&spec()).unwrap();
        assert_eq!(wait_exit(worker.process.as_mut()).await, ExitKind::Clean);

        let crash = ProcessSpawner::new("sh", vec!["-c".into(), "exit 3".into()]);
        let mut worker = crash.spawn(&spec()).unwrap();
        assert_eq!(
            wait_exit(worker.process.as_mut()).await,
            ExitKind::Crashed { code: Some(3) }
        );
    }

    #[tokio::test]
    async fn pipe_is_wired_to_stdio() {
        let echo = ProcessSpawner::new(
            "sh",
            vec!["-c".into(), "echo '\"ready\"'; read line; echo '\"pong\"'".into()],
        );
        let worker = echo.spawn(&spec()).unwrap();
        assert_eq!(worker.channel.recv_ready().await.unwrap(), "ready");
        assert_eq!(worker.channel.request("ping").await.unwrap(), "pong");
    }

    #[tokio::test]
    async fn signalling_a_reaped_process_reports_gone() {
        let spawner = ProcessSpawner::new("sh", vec!["-c".into(), "exit 0".into()]);
        let mut worker = spawner.spawn(&spec()).unwrap();
        wait_exit(worker.process.as_mut()).await;

        let result = worker.process.signal(StopSignal::Interrupt);
        assert!(matches!(
            result,
            Err(crate::error::Error::Cluster(ClusterError::ProcessGone))
        ));
    }

    #[tokio::test]
    async fn interrupt_stops_a_running_process() {
        let spawner = ProcessSpawner::new("sleep", vec!["30".into()]);
        let mut worker = spawner.spawn(&spec()).unwrap();
        assert!(worker.process.try_exit().unwrap().is_none());

        worker.process.signal(StopSignal::Kill).unwrap();
        assert!(wait_exit(worker.process.as_mut()).await.is_crash());
    }
}
