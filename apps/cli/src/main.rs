//! Leadline CLI: website lead intake for Pipedrive.
//!
//! Runs the submission function locally, replays submissions from disk, and
//! renders stored life-insurance applications to PDF.

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
