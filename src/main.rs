use anyhow::Context;
use aqs_pipeline::cli::{run, Cli};
use aqs_pipeline::utils::init_logging;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;
    run(cli).await.context("aqs-pipeline failed")
}
