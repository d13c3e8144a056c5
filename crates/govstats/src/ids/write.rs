use std::path::PathBuf;

use colored::Colorize;
use futures::TryStreamExt;
use govstats_core::chunk::{ChunkWriter, DEFAULT_CHUNK_SIZE};
use govstats_core::state::validate_page_size;
use govstats_core::FetchState;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use super::fetch::{fetch_pages, DEFAULT_PAGE_SIZE};
use crate::client::StatsClient;
use crate::config::{print_credit, EStatConfig};
use crate::prelude::{println, *};

/// Options for fetching the statistics table listing
#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
pub struct FetchOptions {
    /// Number of records per chunk file
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Number of records requested per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Directory for the chunk files (overrides GOVSTATS_IDS_DIR); emptied first
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// How a listing run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingOutcome {
    /// Every page was fetched
    Completed,
    /// The cancel flag was observed; files written so far are kept
    Stopped,
}

/// Result of a listing run
#[derive(Debug, Clone, Serialize)]
pub struct ListingReport {
    pub outcome: ListingOutcome,
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub pages: usize,
    pub records: usize,
}

impl ListingReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == ListingOutcome::Completed
    }
}

/// Parameters for writing the listing to chunk files
#[derive(Debug, Clone)]
pub struct WriteIdsParams {
    pub dir: PathBuf,
    pub chunk_size: usize,
    pub page_size: usize,
}

/// Helper to set spinner message if spinner is present
fn set_spinner_msg(spinner: Option<&ProgressBar>, msg: impl Into<String>) {
    if let Some(s) = spinner {
        s.set_message(msg.into());
    }
}

/// Fetch every listing page and stream it into numbered chunk files
///
/// The cancel flag in `state` is checked after each page; a cancelled run is
/// reported as [`ListingOutcome::Stopped`], not as an error. Failures are
/// logged as critical and returned. The flag is cleared when the run ends.
pub async fn write_ids_data(
    client: &StatsClient,
    state: &FetchState,
    params: WriteIdsParams,
    spinner: Option<&ProgressBar>,
) -> Result<ListingReport> {
    info!("Writing statistics table listing to {}", params.dir.display());

    let result = run_listing(client, state, params, spinner).await;

    match &result {
        Ok(report) if report.is_complete() => info!(
            "Listing completed: {} record(s) in {} file(s)",
            report.records,
            report.files.len()
        ),
        Ok(report) => warn!(
            "Listing stopped after {} page(s): {} record(s) in {} file(s)",
            report.pages,
            report.records,
            report.files.len()
        ),
        Err(e) => error!("CRITICAL: listing fetch failed: {:#}", e),
    }

    state.cancel.reset();
    result
}

async fn run_listing(
    client: &StatsClient,
    state: &FetchState,
    params: WriteIdsParams,
    spinner: Option<&ProgressBar>,
) -> Result<ListingReport> {
    // Checked before the directory is cleared
    validate_page_size(params.page_size)?;

    let mut writer = ChunkWriter::create(&params.dir, params.chunk_size)
        .wrap_err_with(|| f!("Failed to prepare {}", params.dir.display()))?;

    let pages = fetch_pages(client.clone(), state.clone(), params.page_size);
    futures::pin_mut!(pages);

    let mut outcome = ListingOutcome::Completed;
    let mut page_count = 0;

    while let Some(page) = pages.try_next().await? {
        page_count += 1;
        writer.push_page(page)?;
        set_spinner_msg(
            spinner,
            f!(
                "Fetched {} page(s), {} record(s), {} file(s) written...",
                page_count,
                writer.records(),
                writer.files().len()
            ),
        );

        if state.cancel.is_cancelled() {
            outcome = ListingOutcome::Stopped;
            break;
        }
    }

    // The stream also ends quietly when cancelled before its next request
    if state.cancel.is_cancelled() {
        outcome = ListingOutcome::Stopped;
    }

    let records = writer.records();
    let files = writer.finish()?;

    Ok(ListingReport {
        outcome,
        dir: params.dir,
        files,
        pages: page_count,
        records,
    })
}

/// Handle the `ids fetch` command
pub async fn handler(options: FetchOptions, global: crate::Global) -> Result<()> {
    let config = EStatConfig::from_global(&global)?;
    let state = config.fetch_state()?;
    let dir = options.output_dir.clone().unwrap_or(config.ids_dir.clone());

    print_credit();
    let client = StatsClient::new(&config)?;

    // Ctrl-C stops the run after the current page instead of killing it
    let cancel = state.cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current page");
            cancel.cancel();
        }
    });

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .map_err(|e| eyre!("Invalid progress template: {}", e))?,
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    set_spinner_msg(Some(&spinner), "Fetching statistics table listing...");

    let params = WriteIdsParams {
        dir,
        chunk_size: options.chunk_size,
        page_size: options.page_size,
    };
    let report = write_ids_data(&client, &state, params, Some(&spinner)).await;

    watcher.abort();
    spinner.finish_and_clear();
    let report = report?;

    if options.json {
        let json_output = serde_json::to_string_pretty(&report)
            .map_err(|e| eyre!("Failed to serialize output: {}", e))?;
        println!("{}", json_output);
        return Ok(());
    }

    println!("{}", format_report(&report));
    Ok(())
}

/// Human readable report of a listing run
pub fn format_report(report: &ListingReport) -> String {
    let status = match report.outcome {
        ListingOutcome::Completed => "completed".bright_green(),
        ListingOutcome::Stopped => "stopped".bright_yellow(),
    };

    let mut out = f!(
        "\nListing {}: {} record(s) from {} page(s) in {} file(s)\n",
        status,
        report.records.to_string().bold(),
        report.pages,
        report.files.len()
    );
    out.push_str(&f!("Directory: {}\n", report.dir.display().to_string().cyan()));
    if !report.is_complete() {
        out.push_str(&f!(
            "{}\n",
            "The listing is partial; run `govstats ids fetch` again for the full set.".dimmed()
        ));
    }
    out
}
