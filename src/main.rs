use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use corteo_ingest::config::AppConfig;
use corteo_ingest::db::{EventStore, Store};
use corteo_ingest::{open_store, run_batch, run_source, scraping};

#[derive(Parser)]
#[command(name = "corteo-ingest", about = "Scrape and store local activism events")]
struct Cli {
    /// Only scrape this source
    #[arg(long)]
    source: Option<String>,

    /// Print the known sources and exit
    #[arg(long)]
    list: bool,

    /// Run against a throwaway in-memory store
    #[arg(long)]
    dry_run: bool,

    /// Courtesy delay between network calls, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Log as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("corteo_ingest=info"));
    if cli.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    if cli.list {
        for source in scraping::list_sources() {
            println!("{}\t{}\t{}", source.id, source.name, source.url);
        }
        return Ok(());
    }

    let mut config = AppConfig::load();
    if let Some(delay_ms) = cli.delay_ms {
        config.delay_ms = delay_ms;
    }
    config.log_summary();

    let store: Box<dyn EventStore> = if cli.dry_run {
        tracing::info!("dry run, nothing is kept");
        Box::new(Store::open_in_memory()?)
    } else {
        open_store(&config)?
    };

    let summary = match cli.source.as_deref() {
        Some(id) => run_source(&config, id, store)?,
        None => run_batch(&config, store)?,
    };

    println!(
        "processed: {}  persisted: {}  skipped: {}  failed: {}",
        summary.processed, summary.persisted, summary.skipped, summary.failed
    );
    Ok(())
}
