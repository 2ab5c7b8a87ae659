pub mod classify;
pub mod config;
pub mod db;
pub mod dedup;
pub mod location;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod scraping;
pub mod supabase;
pub mod utils;

use anyhow::{anyhow, Context};
use tracing::info;

use config::AppConfig;
use db::{EventStore, Store};
use location::geocoder::NominatimGeocoder;
use pipeline::{BatchSummary, Pipeline};
use scraping::base::HttpFetcher;
use scraping::SourceScraper;
use supabase::RestStore;
use utils::Pacer;

/// Hosted store when credentials are configured, local SQLite otherwise.
pub fn open_store(config: &AppConfig) -> anyhow::Result<Box<dyn EventStore>> {
    if let Some(rest) = RestStore::from_config(config).context("hosted store setup failed")? {
        info!(table = %config.supabase_table, "using hosted store");
        return Ok(Box::new(rest));
    }
    let path = config.database_path();
    info!(path = ?path, "using local store");
    let store = Store::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Box::new(store))
}

/// Scrapes every active source and ingests the results.
pub fn run_batch(config: &AppConfig, store: Box<dyn EventStore>) -> anyhow::Result<BatchSummary> {
    ingest(config, &scraping::active_sources(), store)
}

pub fn run_source(
    config: &AppConfig,
    source_id: &str,
    store: Box<dyn EventStore>,
) -> anyhow::Result<BatchSummary> {
    let source =
        scraping::find_source(source_id).ok_or_else(|| anyhow!("unknown source id: {source_id}"))?;
    ingest(config, &[source], store)
}

fn ingest(
    config: &AppConfig,
    sources: &[Box<dyn SourceScraper>],
    store: Box<dyn EventStore>,
) -> anyhow::Result<BatchSummary> {
    let fetcher = HttpFetcher::from_config(config)?;
    let geocoder = NominatimGeocoder::from_config(config)?;

    let mut pacer = Pacer::new(config.delay());
    let candidates = scraping::collect_candidates(sources, &fetcher, &mut pacer);
    info!(count = candidates.len(), "candidates collected");

    let mut pipeline = Pipeline::new(config, geocoder, store);
    Ok(pipeline.run(candidates))
}
