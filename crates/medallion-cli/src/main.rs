//! Medallion CLI - lakehouse namespace provisioning.
//!
//! The main entry point for the `medallion` binary.

use anyhow::Result;
use clap::Parser;

use medallion_cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    medallion_core::init_logging(cli.log_format.into(), "warn");

    let config = cli.config()?;
    tracing::debug!(?config, "resolved configuration");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Plan(args) => medallion_cli::commands::plan::execute(&args, &config),
            Commands::Apply(args) => medallion_cli::commands::apply::execute(args, &config).await,
            Commands::Verify(args) => {
                medallion_cli::commands::verify::execute(args, &config).await
            }
        }
    })
}
