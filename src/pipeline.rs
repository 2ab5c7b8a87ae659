//! Per-candidate ingestion: normalize, classify, resolve the location,
//! check for duplicates, persist. Candidates run one at a time; a failure on
//! one never stops the batch.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::classify;
use crate::config::AppConfig;
use crate::db::EventStore;
use crate::dedup::Deduplicator;
use crate::location::geocoder::Geocoder;
use crate::location::geometry::{GeoOps, GeometryOps};
use crate::location::LocationResolver;
use crate::models::{Candidate, Event};
use crate::normalize;
use crate::scraping::base;
use crate::utils;

/// Where a candidate currently is. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Scraped,
    Normalized,
    Classified,
    LocationResolved,
    DedupChecked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Persisted(String),
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &Outcome) {
        self.processed += 1;
        match outcome {
            Outcome::Persisted(_) => self.persisted += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

pub struct Pipeline<G, S, O = GeoOps> {
    resolver: LocationResolver<G, O>,
    dedup: Deduplicator,
    store: S,
    country_code: String,
    today: NaiveDate,
}

impl<G: Geocoder, S: EventStore> Pipeline<G, S, GeoOps> {
    pub fn new(config: &AppConfig, geocoder: G, store: S) -> Self {
        Self::with_resolver(config, LocationResolver::new(geocoder, config), store)
    }
}

impl<G: Geocoder, S: EventStore, O: GeometryOps> Pipeline<G, S, O> {
    /// Seeds deduplication from the store's existing titles. A store that
    /// cannot list them leaves the seen set empty.
    pub fn with_resolver(config: &AppConfig, resolver: LocationResolver<G, O>, store: S) -> Self {
        let dedup = match store.existing_titles() {
            Ok(titles) => Deduplicator::new(titles),
            Err(err) => {
                warn!(error = %err, "could not load existing titles, dedup starts empty");
                Deduplicator::default()
            }
        };
        debug!(seen = dedup.len(), "dedup seeded");
        Self {
            resolver,
            dedup,
            store,
            country_code: config.country_code.clone(),
            today: utils::today_in(config.tz()),
        }
    }

    /// Pins "today" used for yearless dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn run<I>(&mut self, candidates: I) -> BatchSummary
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut summary = BatchSummary::default();
        for candidate in candidates {
            let outcome = self.process(&candidate);
            summary.record(&outcome);
        }
        info!(
            processed = summary.processed,
            persisted = summary.persisted,
            skipped = summary.skipped,
            failed = summary.failed,
            "batch finished"
        );
        summary
    }

    pub fn process(&mut self, candidate: &Candidate) -> Outcome {
        let mut stage = Stage::Scraped;

        let title = normalize::title_or_fallback(
            &candidate.title,
            &candidate.description,
            &candidate.source_name,
        );
        let description = normalize::collapse_whitespace(&candidate.description);
        let date = candidate
            .date_text
            .as_deref()
            .and_then(|text| base::parse_date(text, self.today))
            .or_else(|| normalize::leading_date(&candidate.title, self.today));
        let time = candidate
            .time_text
            .as_deref()
            .and_then(base::parse_time);
        advance(&mut stage, Stage::Normalized);

        let category = classify::classify_category(&title, &description);
        let event_type = classify::classify_event_type(&title, &description);
        advance(&mut stage, Stage::Classified);

        let location = self
            .resolver
            .resolve(&format!("{}\n{}", candidate.title, candidate.description));
        advance(&mut stage, Stage::LocationResolved);

        let duplicate = self.dedup.is_duplicate(&title);
        advance(&mut stage, Stage::DedupChecked);
        if duplicate {
            debug!(title = %title, "skipping duplicate");
            return Outcome::Skipped;
        }

        let event = Event {
            id: event_id(&candidate.source_name, &title, date),
            title,
            description,
            category,
            event_type,
            city: location.city,
            address: location.address,
            coordinates: location.coordinates,
            date,
            time,
            source_name: candidate.source_name.clone(),
            source_url: candidate.source_url.clone(),
            country_code: self.country_code.clone(),
            scraped_at_utc: Utc::now().to_rfc3339(),
        };

        match self.store.insert_event(&event) {
            Ok(()) => {
                info!(
                    id = %event.id,
                    title = %event.title,
                    category = %event.category,
                    event_type = %event.event_type,
                    city = %event.city,
                    "event stored"
                );
                self.dedup.remember(&event.title);
                Outcome::Persisted(event.id)
            }
            Err(err) => {
                warn!(title = %event.title, error = %err, "event not stored");
                Outcome::Failed(err.to_string())
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug_assert!(next > *stage, "stage went from {stage:?} to {next:?}");
    *stage = next;
}

/// Stable over re-scrapes of the same item.
pub fn event_id(source_name: &str, title: &str, date: Option<NaiveDate>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_name.as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    if let Some(date) = date {
        hasher.update(date.to_string().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
