mod browser;
mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mapscout_core::{AppConfig, SearchRequest};
use mapscout_scraper::{EventSink, Orchestrator, RunEvent};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::browser::ChromeLauncher;
use crate::report::CsvReportWriter;

#[derive(Debug, Parser)]
#[command(name = "mapscout")]
#[command(about = "Collect business listings from map search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search listings for one or more keywords inside a region
    Search(SearchArgs),
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Read the whole request from a YAML file
    #[arg(long, conflicts_with_all = ["keywords", "region", "min_stars", "min_reviews", "target"])]
    request: Option<PathBuf>,

    /// Keyword to search for (repeatable)
    #[arg(long = "keyword", short = 'k')]
    keywords: Vec<String>,

    /// Free-text region, e.g. "Caçapava, SP"
    #[arg(long, short = 'r')]
    region: Option<String>,

    /// Minimum star rating; unrated listings always pass
    #[arg(long, default_value_t = 0.0)]
    min_stars: f64,

    /// Minimum review count; listings without a count always pass
    #[arg(long, default_value_t = 0)]
    min_reviews: u64,

    /// Accepted listings wanted per keyword
    #[arg(long, default_value_t = 20)]
    target: u32,

    /// CSV report destination (a `_summary.csv` is written next to it)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

impl SearchArgs {
    fn into_request(self) -> anyhow::Result<SearchRequest> {
        if let Some(path) = self.request {
            let mut request = mapscout_core::load_request(&path)?;
            if self.output.is_some() {
                request.output = self.output;
            }
            return Ok(request);
        }

        let Some(region) = self.region else {
            anyhow::bail!("--region is required unless --request is given");
        };
        Ok(SearchRequest {
            keywords: self.keywords.iter().map(|k| k.trim().to_string()).collect(),
            region: region.trim().to_string(),
            min_stars: self.min_stars,
            min_reviews: self.min_reviews,
            target_per_keyword: self.target,
            output: self.output,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = mapscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search(args) => run_search(&config, args).await,
    }
}

async fn run_search(config: &AppConfig, args: SearchArgs) -> anyhow::Result<()> {
    let request = args.into_request()?;
    request.validate()?;

    let (tx, rx) = unbounded_channel();
    let printer = tokio::spawn(print_progress(rx));
    let orchestrator = Orchestrator::from_config(
        config,
        ChromeLauncher::from_config(config),
        CsvReportWriter,
        EventSink::new(tx),
    )?;

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
    let result = orchestrator.run_search(&request, &cancel).await;
    interrupt.abort();
    // Closes the event channel so the printer finishes.
    drop(orchestrator);
    printer.await?;

    let outcome = result?;
    println!(
        "{} listings accepted{}",
        outcome.records.len(),
        if outcome.cancelled { " (cancelled)" } else { "" }
    );
    if let Some(path) = outcome.report_path {
        println!("report: {}", path.display());
    }
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupt received, stopping after the current listing");
        cancel.cancel();
    }
}

/// Log events already reach the terminal through `tracing`; only progress
/// is rendered here.
async fn print_progress(mut rx: UnboundedReceiver<RunEvent>) {
    while let Some(event) = rx.recv().await {
        if let RunEvent::Progress { percent, caption } = event {
            println!("{}", format_progress(percent, &caption));
        }
    }
}

fn format_progress(percent: f64, caption: &str) -> String {
    format!("[{percent:>3.0}%] {caption}")
}
