//! Worker process entrypoint.
//!
//! Start the host, announce readiness, then answer commands until the
//! stop signal arrives (clean exit) or the pipe closes (error exit).

pub mod dispatch;
pub mod eval;
pub mod host;

use std::future::Future;

use tracing::{error, info};

pub use dispatch::CommandLoop;
pub use eval::Evaluator;
pub use host::PassiveHost;

use crate::domain::command::READY;
use crate::error::Result;
use crate::infrastructure::pipe::WorkerEndpoint;
use crate::port::ShardHost;

/// Run one worker to completion.
///
/// Returns `Ok` only when `stop` resolves, after the host has closed.
///
/// # Errors
///
/// Fails if the host cannot start, or if the pipe closes or breaks.
pub async fn run_worker<H, F>(
    cluster: &str,
    mut host: H,
    mut endpoint: WorkerEndpoint,
    allow_eval: bool,
    stop: F,
) -> Result<()>
where
    H: ShardHost,
    F: Future<Output = ()>,
{
    host.init().await?;
    endpoint.send(READY).await?;
    info!(cluster, "Sent ready");

    let mut commands = CommandLoop::new(cluster, host, allow_eval);
    let served = tokio::select! {
        result = commands.serve(&mut endpoint) => Some(result),
        () = stop => None,
    };

    let closed = commands.host_mut().close().await;
    match served {
        None => {
            info!(cluster, "Stop signal received, closed");
            closed
        }
        Some(result) => {
            if let Err(e) = &closed {
                error!(cluster, error = %e, "Host did not close cleanly");
            }
            error!(cluster, "Control pipe lost");
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{duplex, split};
    use tokio::sync::oneshot;

    use super::*;
    use crate::infrastructure::config::logging::LoggingConfig;
    use crate::infrastructure::config::worker::WorkerConfig;
    use crate::infrastructure::pipe::ControlChannel;
    use crate::port::WorkerSpec;

    fn spec() -> WorkerSpec {
        WorkerSpec {
            cluster_name: "Eevee".into(),
            shard_ids: vec![0],
            shard_count: 1,
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[tokio::test]
    async fn handshake_then_commands_then_clean_stop() {
        let (ours, theirs) = duplex(1024);
        let (read, write) = split(ours);
        let channel = ControlChannel::from_io("Eevee", read, write);
        let (read, write) = split(theirs);
        let endpoint = WorkerEndpoint::from_io(read, write);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let worker = tokio::spawn(async move {
            let stop = async {
                let _ = stop_rx.await;
            };
            run_worker("Eevee", PassiveHost::new(&spec()), endpoint, false, stop).await
        });

        assert_eq!(channel.recv_ready().await.unwrap(), "ready");
        assert_eq!(channel.request(r#"{"command":"ping"}"#).await.unwrap(), "pong");
        assert_eq!(channel.request("reloadall").await.unwrap(), "reloaded");

        stop_tx.send(()).unwrap();
        assert!(worker.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn closed_pipe_is_an_error_exit() {
        let (ours, theirs) = duplex(1024);
        let (read, write) = split(theirs);
        let endpoint = WorkerEndpoint::from_io(read, write);
        drop(ours);

        let result = run_worker(
            "Eevee",
            PassiveHost::new(&spec()),
            endpoint,
            false,
            std::future::pending(),
        )
        .await;
        assert!(result.is_err());
    }
}
