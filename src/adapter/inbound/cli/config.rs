//! Handler for the `config` command group.

use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

fn loaded(value: Option<&String>) -> &'static str {
    if value.is_some() {
        "loaded"
    } else {
        "not set"
    }
}

/// Execute `config show`.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = Config::load(path)?;

    output::section("Effective Configuration");
    output::field("Path", path.display());

    output::section("Fleet");
    output::field("Per cluster", config.fleet.shards_per_cluster);
    match config.fleet.shard_count {
        Some(count) => output::field("Shard count", count),
        None => output::field("Shard count", "discovered"),
    }
    output::field("Poll interval", format!("{}s", config.fleet.poll_interval_secs));
    match config.fleet.ready_timeout_secs {
        Some(secs) => output::field("Ready timeout", format!("{secs}s")),
        None => output::field("Ready timeout", "unbounded"),
    }
    output::field("Stop signal", config.fleet.stop_signal);
    output::field("Name pool", format!("{} names", config.name_pool().len()));

    output::section("Relay");
    output::field("Operator input", enabled(config.relay.enabled));
    output::field("Reply timeout", format!("{}s", config.relay.reply_timeout_secs));

    output::section("Gateway");
    output::field("URL", &config.gateway.url);
    output::field("Timeout", format!("{}s", config.gateway.timeout_secs));

    output::section("Worker");
    output::field("Token", loaded(config.worker.token.as_ref()));
    output::field("Database", loaded(config.worker.database_uri.as_ref()));
    if let Some(env) = &config.worker.env {
        output::field("Environment", env);
    }
    output::field("Eval", enabled(config.worker.allow_eval));
    output::field("Extensions", config.worker.extensions.len());

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", &config.logging.format);
    match &config.logging.directory {
        Some(dir) => output::field("Directory", dir.display()),
        None => output::field("Directory", "stderr only"),
    }
    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    output::success("Configuration is valid");
    output::field("Path", path.display());
    if config.worker.token.is_none() {
        output::warning("No bot token set (BOT_TOKEN); launch will fail");
    }
    Ok(())
}
