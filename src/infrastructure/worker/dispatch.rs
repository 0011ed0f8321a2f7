//! Worker command loop.

use tracing::{debug, error, info, warn};

use super::eval::Evaluator;
use crate::domain::command::{
    Command, EVAL_DISABLED, EVAL_MISSING_CONTENT, PONG, RELOADED, RELOAD_FAILED, UNKNOWN,
};
use crate::error::{ChannelError, Result};
use crate::infrastructure::pipe::WorkerEndpoint;
use crate::port::ShardHost;

/// Request-then-reply dispatcher over a worker's pipe.
pub struct CommandLoop<H> {
    cluster: String,
    host: H,
    /// `None` when eval is disabled.
    evaluator: Option<Evaluator>,
}

impl<H: ShardHost> CommandLoop<H> {
    pub fn new(cluster: impl Into<String>, host: H, allow_eval: bool) -> Self {
        Self {
            cluster: cluster.into(),
            host,
            evaluator: allow_eval.then(Evaluator::new),
        }
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Handle one raw payload and produce its reply. Never fails: every
    /// dispatch error becomes reply text.
    pub async fn handle(&mut self, raw: &str) -> String {
        let command = Command::parse(raw);
        info!(cluster = %self.cluster, command = command.name(), "Command received");

        let reply = match command {
            Command::Ping => PONG.to_owned(),
            Command::Eval(content) => match (&mut self.evaluator, content) {
                (None, _) => {
                    warn!(cluster = %self.cluster, "Rejected eval, disabled");
                    EVAL_DISABLED.to_owned()
                }
                (Some(_), None) => EVAL_MISSING_CONTENT.to_owned(),
                (Some(evaluator), Some(code)) => {
                    debug!(cluster = %self.cluster, code = %code, "Evaluating snippet");
                    evaluator.run(&code, &self.host.context())
                }
            },
            Command::ReloadAll => match self.host.reload().await {
                Ok(()) => RELOADED.to_owned(),
                Err(e) => {
                    error!(cluster = %self.cluster, error = %e, "Reload failed");
                    RELOAD_FAILED.to_owned()
                }
            },
            Command::Unknown(name) => {
                debug!(cluster = %self.cluster, command = %name, "Unknown command");
                UNKNOWN.to_owned()
            }
        };

        info!(cluster = %self.cluster, reply = %reply, "Reply sent");
        reply
    }

    /// Serve requests until the pipe fails.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when the orchestrator closes the
    /// pipe, or the underlying error if reading or writing fails.
    pub async fn serve(&mut self, endpoint: &mut WorkerEndpoint) -> Result<()> {
        loop {
            let Some(raw) = endpoint.recv().await? else {
                return Err(ChannelError::Closed.into());
            };
            let reply = self.handle(&raw).await;
            endpoint.send(&reply).await?;
        }
    }
}
