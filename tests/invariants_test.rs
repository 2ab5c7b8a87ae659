mod common;

use chrono::NaiveDate;
use common::{candidate, test_config, MemoryStore, ScriptedGeocoder, TimeoutGeocoder};
use corteo_ingest::classify::{classify_category, classify_event_type};
use corteo_ingest::models::{Category, EventType};
use corteo_ingest::normalize::normalize_title;
use corteo_ingest::pipeline::Pipeline;

const TITLES: [&str; 12] = [
    "15/07 Milano - Sciopero per il clima",
    "Roma – Corteo nazionale per la Palestina",
    "\"Assemblea cittadina\"",
    "Piazza Maggiore - presidio per la sanità pubblica",
    "03.10.2025 Napoli - Workshop di autodifesa femminista",
    "  ",
    "Cena sociale",
    "Pride di Torino 2025",
    "«Incontro: trasparenza e antimafia»",
    "12/13 non una data",
    "Via Roma, Bologna",
    "ℹ️ 🚲 Critical mass",
];

#[test]
fn classification_stays_inside_the_taxonomies() {
    for title in TITLES {
        let category = classify_category(title, "descrizione qualsiasi");
        let event_type = classify_event_type(title, "");
        assert!(Category::ALL.contains(&category), "{title}: {category:?}");
        assert!(EventType::ALL.contains(&event_type), "{title}: {event_type:?}");
    }
}

#[test]
fn normalizing_twice_changes_nothing() {
    for title in TITLES {
        let once = normalize_title(title);
        assert_eq!(normalize_title(&once), once, "input: {title:?}");
    }
}

#[test]
fn stored_coordinates_are_always_valid() {
    let config = test_config();
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).expect("date");

    let timeout = TimeoutGeocoder::new();
    let mut failing = Pipeline::new(&config, &timeout, MemoryStore::default()).with_today(today);
    failing.run(TITLES.iter().map(|t| candidate(t, "")));

    let broken = ScriptedGeocoder::point(f64::NAN, 500.0);
    let mut garbage = Pipeline::new(&config, &broken, MemoryStore::default()).with_today(today);
    garbage.run(TITLES.iter().map(|t| candidate(t, "")));

    for store in [failing.into_store(), garbage.into_store()] {
        assert!(!store.events.is_empty());
        for event in &store.events {
            assert!(event.coordinates.is_valid(), "{}: {:?}", event.title, event.coordinates);
            assert!(!event.title.trim().is_empty());
            assert!(!event.city.is_empty());
        }
    }
}
