//! ContentForge CLI — compliance-gated content production.
//!
//! Validates brand and request documents, builds the cached brand
//! context, routes the request to its agent set, and delivers the
//! resulting artifact.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
