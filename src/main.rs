use clap::Parser;

use shardline::adapter::inbound::cli::command::Cli;
use shardline::adapter::inbound::cli::{self, output};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let code = match cli::run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            output::error(&e.to_string());
            1
        }
    };

    // Pending stdin reads must not hold the process open.
    std::process::exit(code);
}
