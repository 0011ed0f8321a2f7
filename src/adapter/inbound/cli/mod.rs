//! CLI module graph and dispatch.

pub mod command;
pub mod config;
pub mod launch;
pub mod output;
pub mod plan;
pub mod signal;
pub mod worker;

use command::{Cli, Commands, ConfigCommand};
use output::OutputConfig;

use crate::error::Result;

/// Run the parsed command line.
///
/// # Errors
///
/// Returns the command's error; the binary prints it and exits 1.
pub async fn run(cli: Cli) -> Result<()> {
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    match cli.command {
        Commands::Launch(args) => launch::execute(&args).await,
        Commands::Worker => worker::execute().await,
        Commands::Plan(args) => plan::execute(&args).await,
        Commands::Config(ConfigCommand::Show(args)) => config::execute_show(&args.config),
        Commands::Config(ConfigCommand::Validate(args)) => config::execute_validate(&args.config),
    }
}
