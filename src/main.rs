use anyhow::Result;
use clap::Parser;
use jokebot::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    jokebot::run(args).await
}
