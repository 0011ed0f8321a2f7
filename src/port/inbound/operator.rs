//! Operator console port.

use async_trait::async_trait;

use crate::domain::reply::ClusterReply;
use crate::error::Result;

/// Line-oriented operator input.
#[async_trait]
pub trait LineSource: Send {
    /// Next operator line, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

/// Destination for per-cluster broadcast results, fed as they arrive.
pub trait ReplySink: Send {
    fn deliver(&mut self, reply: &ClusterReply);
}

impl<F> ReplySink for F
where
    F: FnMut(&ClusterReply) + Send,
{
    fn deliver(&mut self, reply: &ClusterReply) {
        self(reply);
    }
}
