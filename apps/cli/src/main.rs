//! TrainSet CLI: build supervised training datasets from the web.
//!
//! Discovers sources for a topic, scrapes them, and has a language model
//! annotate the text into input/output pairs exported as CSV.

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
