//! Per-cluster results of an operator broadcast.

use std::fmt;

/// Marker printed when a cluster does not answer in time.
pub const TIMED_OUT: &str = "[timed out]";
/// Marker printed when a cluster's pipe is gone.
pub const CHANNEL_CLOSED: &str = "[channel closed]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Reply(String),
    TimedOut,
    Closed,
}

/// One cluster's answer to a broadcast command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterReply {
    pub cluster: String,
    pub outcome: ReplyOutcome,
}

impl ClusterReply {
    /// Reply text, or the marker standing in for it.
    #[must_use]
    pub fn text(&self) -> &str {
        match &self.outcome {
            ReplyOutcome::Reply(reply) => reply,
            ReplyOutcome::TimedOut => TIMED_OUT,
            ReplyOutcome::Closed => CHANNEL_CLOSED,
        }
    }
}

impl fmt::Display for ClusterReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.cluster, self.text())
    }
}
