//! Chainvault CLI - command-line wallet for EVM, Solana and Tron.

mod commands;
mod config;
mod output;
mod telemetry;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = commands::Cli::parse();

    if let Err(e) = commands::run(cli).await {
        output::print_error(&format!("Error: {}", e));
        std::process::exit(1);
    }

    Ok(())
}
