//! Logging configuration and initialization.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Log file name used by the orchestrator process.
pub const LAUNCHER_LOG_NAME: &str = "Launcher";

/// Logging configuration.
///
/// Shared by the orchestrator and every worker it spawns; workers receive
/// a copy inside their spawn bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
    /// Directory for `cluster-<name>.log` files. Stderr only when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_level() -> String {
    "info".into()
}

fn default_format() -> String {
    "pretty".into()
}

impl LoggingConfig {
    /// Initialize the tracing subscriber for the process named `name`.
    ///
    /// Always logs to stderr; stdout belongs to the control pipe in workers.
    /// When a directory is configured, also appends to `cluster-<name>.log`.
    pub fn init(&self, name: &str) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let json = self.format == "json";

        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
        if json {
            layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
        } else {
            layers.push(fmt::layer().with_writer(std::io::stderr).boxed());
        }

        if let Some(file) = self.directory.as_deref().and_then(|dir| open_log_file(dir, name)) {
            let writer = Arc::new(file);
            if json {
                layers.push(fmt::layer().json().with_writer(writer).boxed());
            } else {
                layers.push(fmt::layer().with_ansi(false).with_writer(writer).boxed());
            }
        }

        let _ = tracing_subscriber::registry()
            .with(layers)
            .with(filter)
            .try_init();
    }
}

/// Path of the log file for the process `name` inside `dir`.
#[must_use]
pub fn log_file_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("cluster-{name}.log"))
}

fn open_log_file(dir: &Path, name: &str) -> Option<File> {
    let path = log_file_path(dir, name);
    let opened = fs::create_dir_all(dir).and_then(|()| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    });
    match opened {
        Ok(file) => Some(file),
        Err(e) => {
            // The subscriber is not installed yet.
            eprintln!("cannot open log file {}: {e}", path.display());
            None
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_path_uses_cluster_prefix() {
        let path = log_file_path(Path::new("logs"), "Arbok");
        assert_eq!(path, PathBuf::from("logs/cluster-Arbok.log"));
    }

    #[test]
    fn defaults_log_to_stderr_only() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "pretty");
        assert!(config.directory.is_none());
    }
}
