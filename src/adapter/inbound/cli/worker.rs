//! Handler for the hidden `worker` command.
//!
//! stdout carries the control pipe here, so nothing else may print to it.

use tracing::info;

use crate::adapter::inbound::cli::signal;
use crate::error::{ConfigError, Result};
use crate::infrastructure::pipe::WorkerEndpoint;
use crate::infrastructure::process::WORKER_SPEC_ENV;
use crate::infrastructure::worker::{run_worker, PassiveHost};
use crate::port::WorkerSpec;

/// Execute the worker command.
pub async fn execute() -> Result<()> {
    let raw = std::env::var(WORKER_SPEC_ENV).map_err(|_| ConfigError::MissingField {
        field: WORKER_SPEC_ENV,
    })?;
    let spec: WorkerSpec = serde_json::from_str(&raw)?;
    spec.logging.init(&spec.cluster_name);

    info!(
        cluster = %spec.cluster_name,
        shards = ?spec.shard_ids,
        shard_count = spec.shard_count,
        pid = std::process::id(),
        "Worker starting"
    );

    let host = PassiveHost::new(&spec);
    run_worker(
        &spec.cluster_name,
        host,
        WorkerEndpoint::stdio(),
        spec.worker.allow_eval,
        signal::shutdown(),
    )
    .await
}
