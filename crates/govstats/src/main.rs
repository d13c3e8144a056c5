use crate::prelude::*;
use clap::Parser;

mod client;
mod config;
mod diagnostics;
mod error;
mod filter_args;
mod ids;
mod output;
mod prelude;
mod table;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Retrieve, chunk and filter Japanese government statistics from the e-Stat API"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// e-Stat application ID
    #[clap(long, env = "ESTAT_APP_ID", global = true, hide_env_values = true)]
    app_id: Option<String>,

    /// Response format requested from the API
    #[clap(long, env = "ESTAT_FORMAT", global = true, value_enum)]
    format: Option<config::Format>,

    /// Language of the returned labels
    #[clap(long, env = "ESTAT_LANG", global = true, value_enum)]
    lang: Option<config::Lang>,

    /// e-Stat API base URL
    #[clap(long, env = "ESTAT_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Whether to display additional information.
    #[clap(long, env = "GOVSTATS_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Statistics table listing (fetch into chunk files, show)
    Ids(crate::ids::App),

    /// Single statistics table operations
    Table(crate::table::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Ids(sub_app) => crate::ids::run(sub_app, app.global).await,
        SubCommands::Table(sub_app) => crate::table::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
