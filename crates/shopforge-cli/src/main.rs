//! `shopforge`: generate storefront components and preview them in an
//! isolated runner.

mod cli;
mod commands;

use clap::Parser as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    shopforge_preview::init_observability();
    let cli = cli::Cli::parse();
    commands::run(cli.command).await
}
