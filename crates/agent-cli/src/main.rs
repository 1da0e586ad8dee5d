use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    agent_cli::run(agent_cli::Cli::parse()).await
}
