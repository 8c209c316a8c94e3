mod app;
mod core;

use anyhow::Result;
use clap::Parser;

use app::{config::setup, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup::init(cli.verbose)?;

    app::run(cli).await
}
