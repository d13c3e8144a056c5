pub mod fetch;
pub mod show;
pub mod write;

use crate::prelude::{println, *};

/// Statistics table listing - root command
#[derive(Debug, clap::Parser)]
#[command(name = "ids")]
#[command(about = "Statistics table listing (fetch into chunk files, show)")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Fetch every statistics table summary into numbered CSV files
    #[clap(name = "fetch")]
    Fetch(write::FetchOptions),

    /// Show the saved listing, optionally filtered
    #[clap(name = "show")]
    Show(show::ShowOptions),
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Running ids command...");
    }

    match app.command {
        Commands::Fetch(options) => write::handler(options, global).await,
        Commands::Show(options) => show::handler(options, global),
    }
}
