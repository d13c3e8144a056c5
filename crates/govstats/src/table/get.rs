use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use govstats_core::state::validate_stats_data_id;
use govstats_core::{decode_table, filter_table, FetchState, StatsTable};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::{Deserialize, Serialize};

use crate::client::StatsClient;
use crate::config::{print_credit, EStatConfig};
use crate::diagnostics::decode_or_dump;
use crate::filter_args::FilterArgs;
use crate::output::{format_records_json, format_summary, print_stats_table, DisplaySummary};
use crate::prelude::{println, *};

/// Default number of rows requested from the API
pub const DEFAULT_ROW_LIMIT: usize = 100;

/// Options for fetching a single statistics table
#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
pub struct GetOptions {
    /// Statistics table ID (ten digits)
    #[arg(value_name = "STATS_DATA_ID")]
    pub stats_data_id: String,

    #[clap(flatten)]
    pub filter: FilterArgs,

    /// Maximum number of rows requested from the API
    #[arg(short, long, default_value_t = DEFAULT_ROW_LIMIT)]
    pub limit: usize,

    /// Write the displayed table to a timestamped CSV file
    #[arg(long)]
    pub export: bool,

    /// Directory for exported files (overrides GOVSTATS_OUTPUT_DIR)
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Fetch one statistics table and decode it into a [`StatsTable`]
///
/// Exactly one request is made. The ID is checked first, so a malformed ID
/// never reaches the network.
pub async fn get_table_data(
    client: &StatsClient,
    state: &FetchState,
    stats_data_id: &str,
    limit: usize,
) -> Result<StatsTable> {
    let id = validate_stats_data_id(stats_data_id)
        .map_err(|e| eyre!("Invalid statistics table ID: {}", e))?;

    info!("Fetching statistics table {} as {}", id, state.format);

    let body = client
        .get_text(
            state.format.table_endpoint(),
            &[
                ("appId", state.app_id.clone()),
                ("statsDataId", id),
                ("limit", limit.to_string()),
                ("metaGetFlg", "Y".to_string()),
                ("cntGetFlg", "N".to_string()),
                ("explanationGetFlg", "N".to_string()),
                ("annotationGetFlg", "N".to_string()),
                ("sectionHeaderFlg", "1".to_string()),
                ("replaceSpChars", "0".to_string()),
            ],
        )
        .await?;

    let table = decode_or_dump(client.dump_dir(), state.format, &body, |b| {
        decode_table(state.format, b)
    })?;
    info!("Decoded {} row(s) from {}", table.len(), state.format);

    Ok(table)
}

/// Name of an export file for table `id` written at `now`
pub fn export_file_name(id: &str, now: chrono::DateTime<chrono::Local>) -> String {
    f!("stats_table_{}_{}.csv", id, now.format("%Y%m%d_%H%M%S"))
}

/// Write `table` as CSV into `dir`, creating the directory when needed
pub fn export_table(table: &StatsTable, dir: &Path, id: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).wrap_err_with(|| f!("Failed to create {}", dir.display()))?;

    let path = dir.join(export_file_name(id, chrono::Local::now()));
    let file = fs::File::create(&path).wrap_err_with(|| f!("Failed to create {}", path.display()))?;
    table
        .write_csv(file)
        .wrap_err_with(|| f!("Failed to write {}", path.display()))?;

    info!("Exported {} row(s) to {}", table.len(), path.display());
    Ok(path)
}

/// Handle the `table get` command
pub async fn handler(options: GetOptions, global: crate::Global) -> Result<()> {
    let config = EStatConfig::from_global(&global)?;
    let state = config.fetch_state()?;
    let id = validate_stats_data_id(&options.stats_data_id)
        .map_err(|e| eyre!("Invalid statistics table ID: {}", e))?;
    let filter = options.filter.to_spec()?;

    print_credit();
    let client = StatsClient::new(&config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .map_err(|e| eyre!("Invalid progress template: {}", e))?,
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message(f!("Fetching statistics table {}...", id));

    let table = get_table_data(&client, &state, &id, options.limit).await;
    spinner.finish_and_clear();

    let table = match &filter {
        Some(spec) => filter_table(&table?, spec),
        None => table?,
    };

    if options.json {
        println!("{}", format_records_json(&table, None)?);
    } else {
        print_stats_table(&table, None);
        let summary = DisplaySummary::for_table(id.clone(), filter.as_ref(), table.len())
            .with_format(state.format.extension());
        println!("\n{}", format_summary(&summary));
    }

    if options.export {
        let dir = options.export_dir.clone().unwrap_or(config.output_dir);
        let path = export_table(&table, &dir, &id)?;
        println!("Exported to {}", path.display().to_string().cyan());
    }

    Ok(())
}
