mod activity;
mod auth;
mod cli;
mod error;
mod models;
mod providers;
mod query;
mod report;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting CommitLens - GitHub Commit Activity Tool");
    cli.execute().await?;

    Ok(())
}
