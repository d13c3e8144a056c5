use std::path::{Path, PathBuf};

use govstats_core::chunk::load_summaries;
use govstats_core::{filter_table, FilterSpec, StatsTable};
use serde::{Deserialize, Serialize};

use crate::config::EStatConfig;
use crate::filter_args::FilterArgs;
use crate::output::{format_records_json, format_summary, print_stats_table, DisplaySummary};
use crate::prelude::{println, *};

/// Options for showing the saved listing
#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
pub struct ShowOptions {
    /// Directory holding the chunk files (overrides GOVSTATS_IDS_DIR)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    #[clap(flatten)]
    pub filter: FilterArgs,

    /// Maximum number of rows to display
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Reload the listing from `dir` and apply `filter`
pub fn show_ids_data(dir: &Path, filter: Option<&FilterSpec>) -> Result<StatsTable> {
    let table = load_summaries(dir)
        .wrap_err_with(|| f!("Failed to load the listing; run `govstats ids fetch` first"))?;

    Ok(match filter {
        Some(spec) => filter_table(&table, spec),
        None => table,
    })
}

/// Handle the `ids show` command
pub fn handler(options: ShowOptions, global: crate::Global) -> Result<()> {
    let config = EStatConfig::from_global(&global)?;
    let dir = options.dir.clone().unwrap_or(config.ids_dir);
    let filter = options.filter.to_spec()?;

    let table = show_ids_data(&dir, filter.as_ref())?;

    if options.json {
        println!("{}", format_records_json(&table, options.limit)?);
        return Ok(());
    }

    print_stats_table(&table, options.limit);
    let summary = DisplaySummary::for_listing(&dir, filter.as_ref(), table.len());
    println!("\n{}", format_summary(&summary));

    Ok(())
}
