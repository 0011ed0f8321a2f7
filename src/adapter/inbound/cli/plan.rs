//! Handler for the `plan` command.

use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::PlanArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::shard::{ShardId, ShardPlan};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::gateway::GatewayClient;
use crate::port::ShardCountSource;

#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "Cluster")]
    name: String,
    #[tabled(rename = "Shards")]
    shards: String,
    #[tabled(rename = "Count")]
    count: usize,
}

/// Execute the plan command.
pub async fn execute(args: &PlanArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::parse_toml("")?,
    };

    let per_cluster = args.per_cluster.unwrap_or(config.fleet.shards_per_cluster);
    if per_cluster == 0 {
        return Err(ConfigError::InvalidValue {
            field: "per_cluster",
            reason: "must be > 0".into(),
        }
        .into());
    }

    let shard_count = match args.shards.or(config.fleet.shard_count) {
        Some(count) => count,
        None => {
            let client = GatewayClient::new(&config.gateway, config.require_token()?)?;
            client.shard_count().await?
        }
    };

    let plan = ShardPlan::build(shard_count, per_cluster, config.name_pool())?;
    print_plan(&plan)
}

fn print_plan(plan: &ShardPlan) -> Result<()> {
    if output::is_json() {
        output::json_output(serde_json::to_value(plan)?);
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Shards", plan.shard_count);
    output::field("Per cluster", plan.per_cluster);
    output::field("Clusters", plan.clusters.len());
    output::section("Clusters");

    let rows: Vec<ClusterRow> = plan
        .clusters
        .iter()
        .map(|c| ClusterRow {
            name: c.name.clone(),
            shards: shard_list(&c.shard_ids),
            count: c.shard_ids.len(),
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}

fn shard_list(ids: &[ShardId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_lists_are_comma_separated() {
        assert_eq!(shard_list(&[4, 5, 6]), "4, 5, 6");
        assert_eq!(shard_list(&[]), "");
    }
}
