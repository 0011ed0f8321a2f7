//! Built-in worker host.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::shard::ShardId;
use crate::error::Result;
use crate::port::{HostContext, ShardHost, WorkerSpec};

/// Host that tracks its shard assignment without opening a gateway
/// connection. Stands in wherever the application layer is not linked.
#[derive(Debug)]
pub struct PassiveHost {
    cluster: String,
    shard_ids: Vec<ShardId>,
    shard_count: u32,
    env: Option<String>,
    extensions: Vec<String>,
    ready: Vec<ShardId>,
    generation: u64,
    enabled: bool,
    started: Instant,
}

impl PassiveHost {
    #[must_use]
    pub fn new(spec: &WorkerSpec) -> Self {
        Self {
            cluster: spec.cluster_name.clone(),
            shard_ids: spec.shard_ids.clone(),
            shard_count: spec.shard_count,
            env: spec.worker.env.clone(),
            extensions: spec.worker.extensions.clone(),
            ready: Vec::new(),
            generation: 0,
            enabled: false,
            started: Instant::now(),
        }
    }

    /// Extension load count; bumped by every reload.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn post_init(&mut self) {
        for extension in &self.extensions {
            debug!(cluster = %self.cluster, extension, "Loading extension");
        }
        self.generation += 1;
        self.enabled = true;
    }
}

#[async_trait]
impl ShardHost for PassiveHost {
    async fn init(&mut self) -> Result<()> {
        for shard in &self.shard_ids {
            info!(cluster = %self.cluster, shard, "Shard ready");
        }
        self.ready = self.shard_ids.clone();
        self.post_init();
        info!(
            cluster = %self.cluster,
            shards = ?self.shard_ids,
            shard_count = self.shard_count,
            "Cluster initialized"
        );
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        info!(cluster = %self.cluster, extensions = self.extensions.len(), "Reloading extensions");
        self.post_init();
        Ok(())
    }

    fn context(&self) -> HostContext {
        let mut context = HostContext::new();
        context.insert("cluster".into(), json!(self.cluster));
        context.insert("shards".into(), json!(self.ready));
        context.insert("shard_count".into(), json!(self.shard_count));
        context.insert(
            "env".into(),
            self.env.as_ref().map_or(Value::Null, |env| json!(env)),
        );
        context.insert("generation".into(), json!(self.generation));
        context.insert("extensions".into(), json!(self.extensions));
        context.insert("enabled".into(), json!(self.enabled));
        context.insert("uptime_secs".into(), json!(self.started.elapsed().as_secs()));
        context.insert("pid".into(), json!(std::process::id()));
        context
    }

    async fn close(&mut self) -> Result<()> {
        info!(cluster = %self.cluster, "Closing gateway connection");
        self.enabled = false;
        self.ready.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::logging::LoggingConfig;
    use crate::infrastructure::config::worker::WorkerConfig;

    fn spec() -> WorkerSpec {
        WorkerSpec {
            cluster_name: "Diglett".into(),
            shard_ids: vec![4, 5],
            shard_count: 6,
            worker: WorkerConfig {
                extensions: vec!["pokemon".into(), "trading".into()],
                ..Default::default()
            },
            logging: LoggingConfig::default(),
        }
    }

    #[tokio::test]
    async fn init_marks_assigned_shards_ready() {
        let mut host = PassiveHost::new(&spec());
        assert_eq!(host.context()["shards"], json!([]));

        host.init().await.unwrap();
        let context = host.context();
        assert_eq!(context["shards"], json!([4, 5]));
        assert_eq!(context["cluster"], json!("Diglett"));
        assert_eq!(context["enabled"], json!(true));
    }

    #[tokio::test]
    async fn reload_bumps_generation() {
        let mut host = PassiveHost::new(&spec());
        host.init().await.unwrap();
        host.reload().await.unwrap();
        assert_eq!(host.generation(), 2);

        host.close().await.unwrap();
        assert_eq!(host.context()["enabled"], json!(false));
    }
}
