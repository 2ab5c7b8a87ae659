use std::collections::HashMap;

use crate::models::Coordinates;

/// Geocode results for one pipeline run. Failures are cached as `None` so a
/// location that could not be resolved is not queried again.
#[derive(Debug, Default)]
pub struct GeocodeCache {
    entries: HashMap<String, Option<Coordinates>>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized `"{address}, {city}"`, or just the city without an address.
    pub fn key(address: Option<&str>, city: &str) -> String {
        let raw = match address {
            Some(address) if !address.trim().is_empty() => format!("{address}, {city}"),
            _ => city.to_string(),
        };
        raw.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Outer `None` is a miss; `Some(None)` is a cached failure.
    pub fn get(&self, key: &str) -> Option<Option<Coordinates>> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: String, value: Option<Coordinates>) {
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
