pub mod cache;
pub mod cities;
pub mod geocoder;
pub mod geometry;

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::models::Coordinates;
use crate::normalize;
use crate::utils::Pacer;
use cache::GeocodeCache;
use cities::DEFAULT_COORDINATES;
use geocoder::Geocoder;
use geometry::{GeoOps, GeometryOps};

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?i:via|viale|piazza|piazzale|corso|largo)\s+([\p{L}\p{N}'’]+(?:[ \t]+[\p{L}\p{N}'’]+){0,5})",
    )
    .expect("address regex")
});
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}'’]+").expect("address word regex"));

const CONNECTORS: [&str; 9] = [
    "di", "da", "de", "del", "della", "dello", "dei", "delle", "degli",
];

/// Words that end a street name: prepositions, articles, times and days.
const STOP_WORDS: &[&str] = &[
    "a", "ad", "al", "alla", "alle", "allo", "ai", "agli", "in", "nel", "nella", "per", "con",
    "su", "sul", "sulla", "tra", "fra", "e", "ed", "o", "il", "lo", "la", "le", "i", "gli",
    "un", "una", "uno", "ore", "dalle", "dal", "dalla", "fino", "verso", "presso", "contro",
    "dopo", "prima", "oggi", "domani", "stasera", "insieme", "tutti", "tutte", "anche",
    "lunedi", "martedi", "mercoledi", "giovedi", "venerdi", "sabato", "domenica",
];

/// Lowercase words that follow `via`, `corso` or `largo` without naming a street.
const NOT_STREETS: &[&str] = &[
    "libera", "web", "mail", "email", "zoom", "meet", "streaming", "online", "telefono",
    "whatsapp", "telegram", "social", "facebook", "instagram", "skype", "consumo", "raggio",
    "anticipo", "formazione",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Geocoded,
    /// Known coordinates of the detected city.
    CityFallback,
    /// Neither the text nor the configured city matched a known city.
    DefaultFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub city: String,
    /// Street or square when one was found, otherwise the city.
    pub address: String,
    pub coordinates: Coordinates,
    pub source: LocationSource,
}

/// Turns free text into a city, an address and coordinates. Owns its geocode
/// cache; one resolver per pipeline run.
pub struct LocationResolver<G, O = GeoOps> {
    geocoder: G,
    geometry: O,
    cache: GeocodeCache,
    pacer: Pacer,
    fallback_city: String,
    country_name: String,
}

impl<G: Geocoder> LocationResolver<G, GeoOps> {
    pub fn new(geocoder: G, config: &AppConfig) -> Self {
        Self::with_geometry(geocoder, GeoOps, config)
    }
}

impl<G: Geocoder, O: GeometryOps> LocationResolver<G, O> {
    pub fn with_geometry(geocoder: G, geometry: O, config: &AppConfig) -> Self {
        Self {
            geocoder,
            geometry,
            cache: GeocodeCache::new(),
            pacer: Pacer::new(config.delay()),
            fallback_city: config.fallback_city.clone(),
            country_name: config.country_name.clone(),
        }
    }

    pub fn resolve(&mut self, text: &str) -> ResolvedLocation {
        let found = find_address(text);
        let remaining = match &found {
            Some((span, _)) => format!("{} {}", &text[..span.start], &text[span.end..]),
            None => text.to_string(),
        };
        let address = found.map(|(_, address)| address);

        let detected = cities::detect(&remaining);
        let city = detected
            .map(|c| c.name.to_string())
            .unwrap_or_else(|| self.fallback_city.clone());
        let (fallback, fallback_source) = match detected.or_else(|| cities::by_name(&city)) {
            Some(known) => (known.coordinates, LocationSource::CityFallback),
            None => (DEFAULT_COORDINATES, LocationSource::DefaultFallback),
        };

        let key = GeocodeCache::key(address.as_deref(), &city);
        let geocoded = match self.cache.get(&key) {
            Some(cached) => cached,
            None => {
                let query = match &address {
                    Some(address) => format!("{address}, {city}, {}", self.country_name),
                    None => format!("{city}, {}", self.country_name),
                };
                let looked_up = self.lookup(&query);
                self.cache.insert(key, looked_up);
                looked_up
            }
        };

        let (coordinates, source) = match geocoded {
            Some(coordinates) => (coordinates, LocationSource::Geocoded),
            None => (fallback, fallback_source),
        };

        ResolvedLocation {
            address: address.unwrap_or_else(|| city.clone()),
            city,
            coordinates,
            source,
        }
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    fn lookup(&mut self, query: &str) -> Option<Coordinates> {
        self.pacer.wait();
        match self.geocoder.geocode(query) {
            Ok(Some(hit)) => {
                let refined = geometry::refine(&self.geometry, &hit);
                debug!(query, display_name = %hit.display_name, ?refined, "geocoded");
                refined
            }
            Ok(None) => {
                debug!(query, "no geocoding results");
                None
            }
            Err(err) => {
                warn!(query, error = %err, "geocoding failed, using fallback");
                None
            }
        }
    }
}

/// Street or square mentioned in `text`, title-cased.
pub fn extract_address(text: &str) -> Option<String> {
    find_address(text).map(|(_, address)| address)
}

fn find_address(text: &str) -> Option<(Range<usize>, String)> {
    ADDRESS_RE.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let name = caps.get(1)?;
        let keyword = text[whole.start()..name.start()].trim();

        let mut words: Vec<(&str, usize)> = WORD_RE
            .find_iter(name.as_str())
            .enumerate()
            .take_while(|(index, word)| is_address_word(word.as_str(), *index == 0))
            .map(|(_, word)| (word.as_str(), name.start() + word.end()))
            .collect();
        // A trailing connector or city name belongs to the sentence, not the street.
        while let Some((last, _)) = words.last() {
            let is_city = words.len() > 1 && cities::by_name(last).is_some();
            if !(CONNECTORS.contains(last) || is_city) {
                break;
            }
            words.pop();
        }
        let (_, end) = *words.last()?;

        let formatted = std::iter::once(keyword)
            .chain(words.iter().map(|(word, _)| *word))
            .map(title_word)
            .collect::<Vec<_>>()
            .join(" ");
        Some((whole.start()..end, formatted))
    })
}

/// Names may be lowercase in scraped text; a stop word ends them. A name
/// never opens with a common non-street word, and a lowercase one never
/// opens with a connector or an elided article.
fn is_address_word(word: &str, first: bool) -> bool {
    let starts_upper = match word.chars().next() {
        Some(c) => c.is_uppercase() || c.is_ascii_digit(),
        None => return false,
    };
    let folded = normalize::fold(word);
    if STOP_WORDS.contains(&folded.as_str()) {
        return false;
    }
    if first && NOT_STREETS.contains(&folded.as_str()) {
        return false;
    }
    if first && !starts_upper {
        let elided = folded.contains('\'') && !is_elision(word);
        return !(CONNECTORS.contains(&folded.as_str()) || elided);
    }
    true
}

/// `dell'Arco`, `sull’Isola` and the like.
fn is_elision(word: &str) -> bool {
    ["dell", "dall", "nell", "sull"].iter().any(|prefix| {
        word.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(['\'', '’']))
            .and_then(|rest| rest.chars().next())
            .map_or(false, char::is_uppercase)
    })
}

fn title_word(word: &str) -> String {
    if CONNECTORS.contains(&word) || is_elision(word) {
        return word.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
