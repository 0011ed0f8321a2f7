use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors raised while turning a shard count into clusters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("gateway reported zero shards")]
    NoShards,

    #[error("cluster name pool exhausted: {needed} clusters needed, {available} names available")]
    NamePoolExhausted { needed: usize, available: usize },
}

/// Control pipe errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,
}

/// Worker process lifecycle errors.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("failed to spawn worker for cluster {cluster}: {source}")]
    Spawn {
        cluster: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cluster {cluster} failed readiness handshake: {reason}")]
    Handshake { cluster: String, reason: String },

    #[error("cluster {cluster} did not signal readiness within {secs}s")]
    ReadyTimeout { cluster: String, secs: u64 },

    #[error("worker process is gone")]
    ProcessGone,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("shard count discovery failed: {0}")]
    Discovery(String),

    /// Failure inside the application hosted by a worker.
    #[error("host error: {0}")]
    Host(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
