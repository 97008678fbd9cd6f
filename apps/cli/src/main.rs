//! bookport CLI: export bookmarked forum threads into a block-structured
//! knowledge base, with permission-guarded, auditable destination writes.

mod commands;
mod confirm;
mod progress;

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
