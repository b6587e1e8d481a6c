//! Jobfeed Ingest - job search ingestion tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use jobfeed_common::logging::{init_logging, LogConfig, LogLevel};
use jobfeed_ingest::fetcher::{Fetcher, JSearchClient};
use jobfeed_ingest::{IngestConfig, Operation, Pipeline, RunHistory, RunReport, Trigger};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "jobfeed-ingest")]
#[command(author, version, about = "Job search ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Search query (overrides JSEARCH_QUERY)
    #[arg(short, long, global = true)]
    query: Option<String>,

    /// Number of pages for a full run (overrides JSEARCH_PAGE_COUNT)
    #[arg(short, long, global = true)]
    pages: Option<u32>,

    /// Directory for the raw log, job store and history
    #[arg(long, global = true, env = "JOBFEED_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Mark the run as started by a scheduler
    #[arg(long, global = true)]
    scheduled: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page and append it to the raw log
    Fetch {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Normalize the raw log and merge it into the job store
    Process,

    /// Fetch all configured pages, then normalize and merge
    Run,

    /// Show recent runs
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over flags
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("jobfeed-ingest")
        .build()
        .merge_env()?;

    let guard = init_logging(&log_config)?;

    let trigger = if cli.scheduled {
        Trigger::Scheduled
    } else {
        Trigger::Manual
    };
    let operation = match cli.command {
        Command::Fetch { .. } => Some(Operation::FetchPage),
        Command::Process => Some(Operation::ProcessRawLog),
        Command::Run => Some(Operation::Run),
        Command::History { .. } => None,
    };

    // Flags override the environment before validation
    let (query, pages, data_dir) = (cli.query, cli.pages, cli.data_dir);
    let loaded = IngestConfig::from_env_with(|config| {
        if let Some(query) = query {
            config.query = query;
        }
        if let Some(pages) = pages {
            config.page_count = pages;
        }
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }
    });

    let config = match (loaded, operation) {
        (Ok(config), _) => config,
        (Err(err), Some(operation)) => {
            let report = RunReport::rejected(operation, trigger, err);
            println!("{}", serde_json::to_string_pretty(&report)?);
            drop(guard);
            std::process::exit(1);
        },
        (Err(err), None) => return Err(err.into()),
    };

    let report = match cli.command {
        Command::History { limit } => return print_history(&config, limit),
        Command::Fetch { page } => build_pipeline(&config, trigger)?.fetch_page(page).await,
        Command::Process => build_pipeline(&config, trigger)?.process_raw_log(),
        Command::Run => build_pipeline(&config, trigger)?.run().await,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_success() {
        drop(guard);
        std::process::exit(1);
    }

    info!("Ingestion complete");
    Ok(())
}

fn print_history(config: &IngestConfig, limit: usize) -> Result<()> {
    let history = RunHistory::new(config.history_path());
    let reports = history.recent(limit)?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn build_pipeline(config: &IngestConfig, trigger: Trigger) -> Result<Pipeline<JSearchClient>> {
    let client = JSearchClient::from_config(config).context("Failed to create JSearch client")?;

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] page {pos}/{len}")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    let fetcher = Fetcher::new(client, config.fetch_settings()).with_progress(progress);
    Ok(Pipeline::new(fetcher, config).with_trigger(trigger))
}
