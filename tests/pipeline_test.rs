mod common;

use chrono::NaiveDate;
use common::{candidate, test_config, MemoryStore, ScriptedGeocoder, TimeoutGeocoder};
use corteo_ingest::db::{EventStore, Store};
use corteo_ingest::models::{Category, Coordinates, EventType};
use corteo_ingest::pipeline::{BatchSummary, Outcome, Pipeline};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("date")
}

#[test]
fn climate_strike_is_normalized_classified_and_located() {
    let config = test_config();
    let geocoder = ScriptedGeocoder::point(45.4642, 9.19);
    let mut pipeline =
        Pipeline::new(&config, &geocoder, MemoryStore::default()).with_today(today());

    let mut input = candidate(
        "15/07 Milano - Sciopero per il clima",
        "manifestazione ambientale",
    );
    input.source_url = "https://example.it".to_string();
    let outcome = pipeline.process(&input);
    assert!(matches!(outcome, Outcome::Persisted(_)), "got {outcome:?}");

    let store = pipeline.into_store();
    let event = &store.events[0];
    assert_eq!(event.title, "Sciopero per il clima");
    assert_eq!(event.category, Category::Environment);
    assert_eq!(event.event_type, EventType::Protest);
    assert_eq!(event.city, "Milano");
    assert_eq!(event.address, "Milano");
    assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 7, 15));
    assert_eq!(event.country_code, "IT");
    assert_eq!(event.source_url, "https://example.it");
    assert_eq!(geocoder.queries.borrow().as_slice(), ["Milano, Italia"]);
}

#[test]
fn geocoder_timeout_falls_back_to_detected_city() {
    let config = test_config();
    let geocoder = TimeoutGeocoder::new();
    let mut pipeline =
        Pipeline::new(&config, &geocoder, MemoryStore::default()).with_today(today());

    pipeline.process(&candidate("Presidio a Bologna", "in piazza Maggiore alle 18"));

    let event = &pipeline.store().events[0];
    assert_eq!(event.city, "Bologna");
    assert_eq!(event.address, "Piazza Maggiore");
    assert_eq!(event.coordinates, Coordinates::new(44.4949, 11.3426));
    assert!(event.coordinates.is_valid());
    assert_eq!(geocoder.calls.get(), 1);
}

#[test]
fn polygon_geometry_resolves_to_centroid() {
    let config = test_config();
    let geocoder = ScriptedGeocoder::polygon(vec![vec![
        Coordinates::new(41.0, 12.0),
        Coordinates::new(41.0, 12.4),
        Coordinates::new(41.2, 12.4),
        Coordinates::new(41.2, 12.0),
        Coordinates::new(41.0, 12.0),
    ]]);
    let mut pipeline =
        Pipeline::new(&config, &geocoder, MemoryStore::default()).with_today(today());

    pipeline.process(&candidate("Corteo per Gaza", "da Piazza Vittorio, Roma"));

    let event = &pipeline.store().events[0];
    assert!((event.coordinates.lat - 41.1).abs() < 1e-9);
    assert!((event.coordinates.lon - 12.2).abs() < 1e-9);
    assert_ne!(event.coordinates, Coordinates::new(41.0, 12.0));
    assert_eq!(event.category, Category::PeaceAntiWar);
}

#[test]
fn same_location_is_geocoded_once() {
    let config = test_config();
    let geocoder = ScriptedGeocoder::point(45.07, 7.68);
    let mut pipeline =
        Pipeline::new(&config, &geocoder, MemoryStore::default()).with_today(today());

    let summary = pipeline.run(vec![
        candidate("Presidio sanità pubblica", "Piazza Castello, Torino"),
        candidate("Assemblea precari", "ci vediamo in piazza  Castello a torino"),
    ]);

    assert_eq!(summary.persisted, 2);
    assert_eq!(geocoder.calls(), 1);
}

#[test]
fn near_duplicates_are_skipped() {
    let config = test_config();
    let geocoder = ScriptedGeocoder::point(45.4642, 9.19);
    let store = MemoryStore::with_titles(&["Manifestazione per il clima Milano..."]);
    let mut pipeline = Pipeline::new(&config, &geocoder, store).with_today(today());

    let summary = pipeline.run(vec![
        candidate("Manifestazione per il clima Milano 2025 edition", ""),
        candidate("Assemblea cittadina sul verde pubblico", ""),
        candidate("Assemblea cittadina sul verde pubblico.", ""),
    ]);

    assert_eq!(
        summary,
        BatchSummary {
            processed: 3,
            persisted: 1,
            skipped: 2,
            failed: 0
        }
    );
}

#[test]
fn store_failure_does_not_abort_the_batch() {
    let config = test_config();
    let geocoder = ScriptedGeocoder::point(45.4642, 9.19);
    let store = MemoryStore {
        reject_attempt: Some(3),
        ..MemoryStore::default()
    };
    let mut pipeline = Pipeline::new(&config, &geocoder, store).with_today(today());

    let titles = [
        "Corteo contro la guerra",
        "Presidio per la sanità",
        "Assemblea sindacale",
        "Workshop di autodifesa",
        "Incontro sulla trasparenza",
    ];
    let summary = pipeline.run(titles.iter().map(|t| candidate(t, "Milano")));

    assert_eq!(summary.processed, 5);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.persisted, 4);
    let store = pipeline.into_store();
    assert_eq!(store.attempts, 5);
    let stored: Vec<&str> = store.events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        stored,
        vec![
            "Corteo contro la guerra",
            "Presidio per la sanità",
            "Workshop di autodifesa",
            "Incontro sulla trasparenza"
        ]
    );
}

#[test]
fn failed_title_listing_starts_with_empty_dedup() {
    let config = test_config();
    let geocoder = ScriptedGeocoder::returning(None);
    let store = MemoryStore {
        seed_titles: vec!["Presidio".to_string()],
        fail_listing: true,
        ..MemoryStore::default()
    };
    let mut pipeline = Pipeline::new(&config, &geocoder, store).with_today(today());

    let outcome = pipeline.process(&candidate("Presidio", ""));
    assert!(matches!(outcome, Outcome::Persisted(_)));
    let event = &pipeline.store().events[0];
    assert!(event.coordinates.is_valid());
    assert_eq!(event.city, "Milano");
}

#[test]
fn empty_titles_fall_back_to_description() {
    let config = test_config();
    let geocoder = ScriptedGeocoder::returning(None);
    let mut pipeline =
        Pipeline::new(&config, &geocoder, MemoryStore::default()).with_today(today());

    pipeline.process(&candidate("  ", "Laboratorio di cartelli per il Pride di Padova"));

    let event = &pipeline.store().events[0];
    assert_eq!(event.title, "Laboratorio di cartelli per il Pride di Padova");
    assert_eq!(event.category, Category::Lgbtq);
    assert_eq!(event.event_type, EventType::Workshop);
    assert_eq!(event.city, "Padova");
    assert_eq!(event.date, None);
    assert_eq!(event.time, None);
}

#[test]
fn scraped_dates_and_times_are_parsed() {
    let config = test_config();
    let geocoder = ScriptedGeocoder::returning(None);
    let mut pipeline =
        Pipeline::new(&config, &geocoder, MemoryStore::default()).with_today(today());

    let mut input = candidate("Corteo", "Napoli");
    input.date_text = Some("Sabato 22 novembre 2025".to_string());
    input.time_text = Some("ore 14:30".to_string());
    pipeline.process(&input);

    let event = &pipeline.store().events[0];
    assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 11, 22));
    assert_eq!(event.time, chrono::NaiveTime::from_hms_opt(14, 30, 0));
}

#[test]
fn sqlite_store_rejects_rescraped_items() {
    let config = test_config();
    let geocoder = ScriptedGeocoder::point(45.4642, 9.19);
    let mut store = Store::open_in_memory().expect("store");
    let existing_titles = store.existing_titles().expect("titles");
    assert!(existing_titles.is_empty());

    {
        let mut pipeline = Pipeline::new(&config, &geocoder, &mut store).with_today(today());
        let summary = pipeline.run(vec![candidate("Sciopero generale", "Milano")]);
        assert_eq!(summary.persisted, 1);
    }

    let mut pipeline = Pipeline::new(&config, &geocoder, &mut store).with_today(today());
    let summary = pipeline.run(vec![candidate("Sciopero generale", "Milano")]);
    assert_eq!(summary.skipped, 1);
    drop(pipeline);
    assert_eq!(store.count_events().expect("count"), 1);
}
