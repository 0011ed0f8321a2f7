//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file with environment variable
//! overrides for credentials like `BOT_TOKEN`.
//!
//! # Example
//!
//! ```no_run
//! use shardline::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.logging.init("Launcher");
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::fleet::{FleetConfig, RelayConfig};
use super::gateway::GatewayConfig;
use super::logging::LoggingConfig;
use super::worker::WorkerConfig;
use crate::domain::name::NamePool;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Shard partitioning and liveness supervision.
    #[serde(default)]
    pub fleet: FleetConfig,

    /// Operator command relay.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Gateway-info endpoint used for shard-count discovery.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Settings forwarded to every worker.
    #[serde(default)]
    pub worker: WorkerConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Credentials are read from the environment after parsing, so a value
    /// in the file is replaced by a non-empty environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.worker.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Return the bot token or a missing-field error.
    #[allow(clippy::result_large_err)]
    pub fn require_token(&self) -> Result<&str> {
        self.worker
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField { field: "token" }.into())
    }

    /// Name pool configured for this fleet.
    #[must_use]
    pub fn name_pool(&self) -> NamePool {
        match &self.fleet.cluster_names {
            Some(names) => NamePool::new(names.clone()),
            None => NamePool::default(),
        }
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, reason: &str| -> crate::error::Error {
            ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            }
            .into()
        };

        if self.fleet.shards_per_cluster == 0 {
            return Err(invalid("shards_per_cluster", "must be > 0"));
        }
        if self.fleet.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs", "must be > 0"));
        }
        if self.fleet.ready_timeout_secs == Some(0) {
            return Err(invalid("ready_timeout_secs", "must be > 0 when set"));
        }
        if self.fleet.shard_count == Some(0) {
            return Err(invalid("shard_count", "must be > 0 when set"));
        }
        if let Some(names) = &self.fleet.cluster_names {
            if names.is_empty() {
                return Err(invalid("cluster_names", "must not be empty"));
            }
            if names.iter().any(|name| name.trim().is_empty()) {
                return Err(invalid("cluster_names", "names must not be blank"));
            }
            let mut seen = HashSet::new();
            if !names.iter().all(|name| seen.insert(name.as_str())) {
                return Err(invalid("cluster_names", "names must be unique"));
            }
        }
        if self.relay.reply_timeout_secs == 0 {
            return Err(invalid("reply_timeout_secs", "must be > 0"));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(invalid("timeout_secs", "must be > 0"));
        }
        if self.gateway.url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "url" }.into());
        }
        url::Url::parse(&self.gateway.url).map_err(|e| invalid("url", &e.to_string()))?;
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(invalid("format", "must be \"pretty\" or \"json\""));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exit::StopSignal;
    use crate::error::Error;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.fleet.shards_per_cluster, 4);
        assert_eq!(config.fleet.poll_interval_secs, 5);
        assert_eq!(config.fleet.ready_timeout_secs, None);
        assert_eq!(config.fleet.stop_signal, StopSignal::Interrupt);
        assert_eq!(config.relay.reply_timeout_secs, 5);
        assert!(config.relay.enabled);
        assert_eq!(config.relay.prompt, "$ ");
    }

    #[test]
    fn parses_fleet_section() {
        let config = Config::parse_toml(
            r#"
[fleet]
shards_per_cluster = 2
poll_interval_secs = 1
ready_timeout_secs = 30
shard_count = 6
cluster_names = ["Alpha", "Beta", "Gamma"]
stop_signal = "terminate"
"#,
        )
        .unwrap();

        assert_eq!(config.fleet.shards_per_cluster, 2);
        assert_eq!(config.fleet.shard_count, Some(6));
        assert_eq!(config.fleet.stop_signal, StopSignal::Terminate);
        assert_eq!(config.name_pool().len(), 3);
    }

    #[test]
    fn rejects_zero_shards_per_cluster() {
        let result = Config::parse_toml("[fleet]\nshards_per_cluster = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "shards_per_cluster",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_duplicate_cluster_names() {
        let result = Config::parse_toml("[fleet]\ncluster_names = [\"A\", \"B\", \"A\"]\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "cluster_names",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_zero_ready_timeout() {
        let result = Config::parse_toml("[fleet]\nready_timeout_secs = 0\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "ready_timeout_secs",
                ..
            }))
        ));
    }

    #[test]
    fn rejects_unparseable_gateway_url() {
        let result = Config::parse_toml("[gateway]\nurl = \"not a url\"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue { field: "url", .. }))
        ));
    }

    #[test]
    fn rejects_unknown_log_format() {
        let result = Config::parse_toml("[logging]\nformat = \"xml\"\n");
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue {
                field: "format",
                ..
            }))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = Config::parse_toml("[fleet\n");
        assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
    }
}
