//! Command-line interface definitions.
//!
//! Defines the CLI structure for shardline using `clap`. The orchestrator
//! and its workers are the same binary: `launch` runs the fleet and spawns
//! itself as `worker` once per cluster.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sharded bot cluster orchestrator
#[derive(Parser, Debug)]
#[command(name = "shardline")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the fleet (foreground, interactive)
    Launch(LaunchArgs),

    /// Run one worker. Spawned by `launch`, not meant to be run by hand.
    #[command(hide = true)]
    Worker,

    /// Show how shards would be split into clusters
    Plan(PlanArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `shardline config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show(ConfigPathArg),
    /// Validate a configuration file for correctness.
    Validate(ConfigPathArg),
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Arguments for the `launch` subcommand.
#[derive(Parser, Debug)]
pub struct LaunchArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Do not read operator commands from stdin.
    #[arg(long)]
    pub no_relay: bool,
}

/// Arguments for the `plan` subcommand.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Path to a configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Total shard count. Skips gateway discovery.
    #[arg(long)]
    pub shards: Option<u32>,

    /// Maximum shards per cluster.
    #[arg(long)]
    pub per_cluster: Option<usize>,
}
