use anyhow::Result;
use billfold::cli::Cli;
use billfold::log::init_logging;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    cli.run().await
}
