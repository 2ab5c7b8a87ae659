pub mod base;
pub mod fridays_for_future_html;
pub mod non_una_di_meno_html;

use anyhow::Error;
use tracing::{info, warn};

use crate::models::Candidate;
use crate::utils::Pacer;
use base::Fetcher;

pub trait SourceScraper {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn url(&self) -> &'static str;
    fn fetch(&self, fetcher: &dyn Fetcher) -> anyhow::Result<Vec<Candidate>>;
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

pub fn active_sources() -> Vec<Box<dyn SourceScraper>> {
    vec![
        Box::new(fridays_for_future_html::FridaysForFuture),
        Box::new(non_una_di_meno_html::NonUnaDiMeno),
    ]
}

pub fn list_sources() -> Vec<SourceInfo> {
    active_sources()
        .into_iter()
        .map(|source| SourceInfo {
            id: source.id().to_string(),
            name: source.name().to_string(),
            url: source.url().to_string(),
        })
        .collect()
}

pub fn find_source(id: &str) -> Option<Box<dyn SourceScraper>> {
    active_sources().into_iter().find(|source| source.id() == id)
}

/// Fetches every source in turn. A source that fails contributes no
/// candidates; the others still run.
pub fn collect_candidates(
    sources: &[Box<dyn SourceScraper>],
    fetcher: &dyn Fetcher,
    pacer: &mut Pacer,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut errors: Vec<(&'static str, Error)> = Vec::new();

    for source in sources {
        pacer.wait();
        match source.fetch(fetcher) {
            Ok(mut scraped) => {
                info!(source = source.id(), count = scraped.len(), "scraped source");
                candidates.append(&mut scraped);
            }
            Err(err) => {
                warn!(source = source.id(), error = %err, "source skipped");
                errors.push((source.id(), err));
            }
        }
    }

    if candidates.is_empty() && !errors.is_empty() {
        let joined = errors
            .iter()
            .map(|(id, err)| format!("{id}: {err}"))
            .collect::<Vec<_>>()
            .join("; ");
        warn!(errors = %joined, "no source produced candidates");
    }

    candidates
}
