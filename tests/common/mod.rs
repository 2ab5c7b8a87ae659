#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use corteo_ingest::config::AppConfig;
use corteo_ingest::db::{EventStore, StoreError};
use corteo_ingest::location::geocoder::{GeocodeError, GeocodeHit, Geocoder, Geometry};
use corteo_ingest::models::{Candidate, Coordinates, Event};

pub fn test_config() -> AppConfig {
    AppConfig {
        delay_ms: 0,
        ..AppConfig::default()
    }
}

pub fn candidate(title: &str, description: &str) -> Candidate {
    Candidate::new(title, description).with_source("test", "https://example.it")
}

/// Answers every query with the same hit and records what was asked.
pub struct ScriptedGeocoder {
    hit: Option<GeocodeHit>,
    pub queries: RefCell<Vec<String>>,
}

impl ScriptedGeocoder {
    pub fn returning(hit: Option<GeocodeHit>) -> Self {
        Self {
            hit,
            queries: RefCell::new(Vec::new()),
        }
    }

    pub fn point(lat: f64, lon: f64) -> Self {
        Self::returning(Some(GeocodeHit {
            point: Coordinates::new(lat, lon),
            geometry: None,
            display_name: "point".to_string(),
        }))
    }

    pub fn polygon(rings: Vec<Vec<Coordinates>>) -> Self {
        let reference = rings[0][0];
        Self::returning(Some(GeocodeHit {
            point: reference,
            geometry: Some(Geometry::Polygon(rings)),
            display_name: "area".to_string(),
        }))
    }

    pub fn calls(&self) -> usize {
        self.queries.borrow().len()
    }
}

impl Geocoder for ScriptedGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
        self.queries.borrow_mut().push(query.to_string());
        Ok(self.hit.clone())
    }
}

pub struct TimeoutGeocoder {
    pub calls: Cell<usize>,
}

impl TimeoutGeocoder {
    pub fn new() -> Self {
        Self {
            calls: Cell::new(0),
        }
    }
}

impl Geocoder for TimeoutGeocoder {
    fn geocode(&self, _query: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
        self.calls.set(self.calls.get() + 1);
        Err(GeocodeError::Timeout)
    }
}

/// In-memory store; `reject_attempt` makes the Nth insert attempt (1-based) fail.
#[derive(Default)]
pub struct MemoryStore {
    pub seed_titles: Vec<String>,
    pub events: Vec<Event>,
    pub attempts: usize,
    pub reject_attempt: Option<usize>,
    pub fail_listing: bool,
}

impl MemoryStore {
    pub fn with_titles(titles: &[&str]) -> Self {
        Self {
            seed_titles: titles.iter().map(|t| t.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl EventStore for MemoryStore {
    fn existing_titles(&self) -> Result<Vec<String>, StoreError> {
        if self.fail_listing {
            return Err(StoreError::Backend("listing unavailable".into()));
        }
        Ok(self.seed_titles.clone())
    }

    fn insert_event(&mut self, event: &Event) -> Result<(), StoreError> {
        self.attempts += 1;
        if self.reject_attempt == Some(self.attempts) {
            return Err(StoreError::Validation("rejected by test".into()));
        }
        self.events.push(event.clone());
        Ok(())
    }
}
