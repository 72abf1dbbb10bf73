//! Piggy bot binary entry point.

use anyhow::Result;
use clap::Parser;
use piggy_discord::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    Cli::parse().run().await
}
