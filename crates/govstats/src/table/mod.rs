pub mod get;

use crate::prelude::{println, *};

/// Single statistics table operations - root command
#[derive(Debug, clap::Parser)]
#[command(name = "table")]
#[command(about = "Single statistics table operations")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Fetch one statistics table, optionally filter and export it
    #[clap(name = "get")]
    Get(get::GetOptions),
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Running table command...");
    }

    match app.command {
        Commands::Get(options) => get::handler(options, global).await,
    }
}
