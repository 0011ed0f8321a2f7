//! Handler for the `launch` command.

use std::sync::Arc;

use tracing::info;

use crate::adapter::inbound::cli::command::LaunchArgs;
use crate::adapter::inbound::cli::{output, signal};
use crate::domain::reply::ClusterReply;
use crate::error::Result;
use crate::infrastructure::config::logging::LAUNCHER_LOG_NAME;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::console::StdinLines;
use crate::infrastructure::gateway::{FixedShardCount, GatewayClient};
use crate::infrastructure::orchestration::{Console, Launcher};
use crate::infrastructure::process::ProcessSpawner;
use crate::port::ShardCountSource;

type OperatorConsole = Console<StdinLines, fn(&ClusterReply)>;

/// Execute the launch command.
pub async fn execute(args: &LaunchArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    if output::verbosity() > 0 {
        config.logging.level = "debug".into();
    }
    config.logging.init(LAUNCHER_LOG_NAME);

    let token = config.require_token()?.to_owned();
    let discovery: Arc<dyn ShardCountSource> = match config.fleet.shard_count {
        Some(count) => Arc::new(FixedShardCount(count)),
        None => Arc::new(GatewayClient::new(&config.gateway, token)?),
    };
    let spawner = Arc::new(ProcessSpawner::current_exe()?);

    print_startup(&config, args);
    info!(config = %args.config.display(), "Launching fleet");

    let console: Option<OperatorConsole> = if config.relay.enabled && !args.no_relay {
        let source = StdinLines::spawn(config.relay.prompt.clone())?;
        Some(Console::new(source, output::reply as fn(&ClusterReply)))
    } else {
        None
    };

    let mut launcher = Launcher::new(&config, spawner, discovery);
    launcher.run(console, signal::shutdown()).await?;

    output::success("Fleet stopped");
    Ok(())
}

fn print_startup(config: &Config, args: &LaunchArgs) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Config", args.config.display());
    match config.fleet.shard_count {
        Some(count) => output::field("Shards", count),
        None => output::field("Shards", "discovered"),
    }
    output::field("Per cluster", config.fleet.shards_per_cluster);
    if output::verbosity() > 0 {
        output::field("Poll interval", format!("{}s", config.fleet.poll_interval_secs));
        output::field("Reply timeout", format!("{}s", config.relay.reply_timeout_secs));
    }
    if config.worker.allow_eval {
        output::warning("eval is enabled on every worker");
    }
}
