//! Operator command relay.
//!
//! Each operator line goes to every active cluster at once. Replies are
//! awaited independently with a per-cluster timeout and delivered in
//! arrival order, so a silent cluster never delays the others.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use super::fleet::Fleet;
use crate::domain::reply::{ClusterReply, ReplyOutcome};
use crate::infrastructure::pipe::ControlChannel;
use crate::port::{LineSource, ReplySink};

/// Operator input paired with where its replies go.
pub struct Console<S, R> {
    pub source: S,
    pub sink: R,
}

impl<S, R> Console<S, R> {
    pub fn new(source: S, sink: R) -> Self {
        Self { source, sink }
    }
}

/// Send `command` on every channel and collect one result per cluster.
pub async fn broadcast<R>(
    targets: Vec<(String, Arc<ControlChannel>)>,
    command: &str,
    timeout: Duration,
    sink: &mut R,
) -> Vec<ClusterReply>
where
    R: ReplySink + ?Sized,
{
    info!(command, clusters = targets.len(), "Broadcasting operator command");

    let mut pending: FuturesUnordered<_> = targets
        .into_iter()
        .map(|(cluster, channel)| {
            let command = command.to_owned();
            async move {
                let outcome = match tokio::time::timeout(timeout, channel.request(&command)).await
                {
                    Ok(Ok(reply)) => ReplyOutcome::Reply(reply),
                    Ok(Err(_)) => ReplyOutcome::Closed,
                    Err(_) => ReplyOutcome::TimedOut,
                };
                ClusterReply { cluster, outcome }
            }
        })
        .collect();

    let mut replies = Vec::new();
    while let Some(reply) = pending.next().await {
        match &reply.outcome {
            ReplyOutcome::Reply(text) => debug!(cluster = %reply.cluster, reply = %text, "Reply"),
            ReplyOutcome::TimedOut => warn!(cluster = %reply.cluster, "Cluster timed out"),
            ReplyOutcome::Closed => warn!(cluster = %reply.cluster, "Cluster channel closed"),
        }
        sink.deliver(&reply);
        replies.push(reply);
    }
    replies
}

/// Relay operator lines until input ends or the fleet stops.
///
/// End of input stops only the relay. Blank lines are skipped.
pub async fn operator_loop<S, R>(fleet: Arc<Fleet>, mut console: Console<S, R>, timeout: Duration)
where
    S: LineSource,
    R: ReplySink,
{
    while fleet.is_alive() {
        let line = match console.source.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Operator input closed, relay stopped");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read operator input, relay stopped");
                break;
            }
        };

        let command = line.trim_end_matches(['\r', '\n']);
        if command.trim().is_empty() {
            continue;
        }
        broadcast(fleet.channel_snapshot(), command, timeout, &mut console.sink).await;
    }
}
