use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{ElementRef, Selector};
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::Candidate;
use crate::normalize;

static NUMERIC_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})(?:[/.\-](\d{4}|\d{2}))?\b").expect("numeric date regex")
});
static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})").expect("iso date regex"));
static LONG_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:°|º)?\s+([a-zà-ù]+)(?:\s+(\d{4}))?").expect("long date regex")
});
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bore\s+|\bh\s*)?\b([01]?\d|2[0-3])(?:[:.]([0-5]\d)|\s*(?:h\b))")
        .expect("time regex")
});
static ORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bore\s+([01]?\d|2[0-3])\b").expect("ore regex"));

const MONTHS: &[(&str, u32)] = &[
    ("gennaio", 1),
    ("febbraio", 2),
    ("marzo", 3),
    ("aprile", 4),
    ("maggio", 5),
    ("giugno", 6),
    ("luglio", 7),
    ("agosto", 8),
    ("settembre", 9),
    ("ottobre", 10),
    ("novembre", 11),
    ("dicembre", 12),
    ("gen", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("mag", 5),
    ("giu", 6),
    ("lug", 7),
    ("ago", 8),
    ("set", 9),
    ("sett", 9),
    ("ott", 10),
    ("nov", 11),
    ("dic", 12),
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("jan", 1),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("sept", 9),
    ("oct", 10),
    ("dec", 12),
];

/// Words that introduce a clock time, so `ore 10.05` is never read as a date.
const TIME_MARKERS: [&str; 5] = ["ore", "h", "alle", "dalle", "entro"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },
}

/// Source page download, kept behind a trait so sources can be tested offline.
pub trait Fetcher {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.user_agent, config.http_timeout())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let wrap = |err: reqwest::Error| {
            if err.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Http {
                    url: url.to_string(),
                    message: err.to_string(),
                }
            }
        };
        let response = self.client.get(url).send().map_err(wrap)?;
        let response = response.error_for_status().map_err(wrap)?;
        response.text().map_err(wrap)
    }
}

pub fn clean_text(input: &str) -> String {
    normalize::collapse_whitespace(input)
}

pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(inner_text)
        .filter(|text| !text.is_empty())
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href);
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(&href).ok().map(|u| u.to_string())
}

/// Parses `2025-07-15`, `sabato 15 luglio [2025]`, `sab 15 lug` and
/// `15/07[/2025]`. Yearless dates are placed on or after `today`. Numbers
/// introduced by `ore`, `alle` and the like are times and are skipped.
pub fn parse_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let cleaned = clean_text(text);
    if let Some(caps) = ISO_DATE_RE.captures(&cleaned) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
        if date.is_some() {
            return date;
        }
    }

    let folded = normalize::fold(&cleaned);
    for caps in LONG_DATE_RE.captures_iter(&folded) {
        let month = match MONTHS.iter().find(|(name, _)| *name == &caps[2]) {
            Some((_, month)) => *month,
            None => continue,
        };
        let day = match caps[1].parse() {
            Ok(day) => day,
            Err(_) => continue,
        };
        let year = caps.get(3).and_then(|y| y.as_str().parse::<i32>().ok());
        if let Some(date) = build_date(day, month, year, today) {
            return Some(date);
        }
    }

    for caps in NUMERIC_DATE_RE.captures_iter(&cleaned) {
        let whole = match caps.get(0) {
            Some(whole) => whole,
            None => continue,
        };
        let clock = cleaned[whole.end()..].starts_with(':');
        if clock || follows_time_marker(&cleaned[..whole.start()]) {
            continue;
        }
        let (day, month) = match (caps[1].parse(), caps[2].parse()) {
            (Ok(day), Ok(month)) => (day, month),
            _ => continue,
        };
        let year = caps
            .get(3)
            .and_then(|y| y.as_str().parse::<i32>().ok())
            .map(|y| if y < 100 { y + 2000 } else { y });
        if let Some(date) = build_date(day, month, year, today) {
            return Some(date);
        }
    }
    None
}

fn follows_time_marker(before: &str) -> bool {
    let last_word = before
        .trim_end()
        .rsplit(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or("")
        .to_lowercase();
    TIME_MARKERS.contains(&last_word.as_str())
}

/// Parses `18:30`, `18.30`, `ore 18`, `18h`.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let cleaned = clean_text(text);
    if let Some(caps) = TIME_RE.captures(&cleaned) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }
    let caps = ORE_RE.captures(&cleaned)?;
    NaiveTime::from_hms_opt(caps[1].parse().ok()?, 0, 0)
}

fn build_date(day: u32, month: u32, year: Option<i32>, today: NaiveDate) -> Option<NaiveDate> {
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => {
            let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if date < today {
                NaiveDate::from_ymd_opt(today.year() + 1, month, day)
            } else {
                Some(date)
            }
        }
    }
}

pub fn build_candidate(
    source_name: &str,
    source_url: String,
    title: String,
    description: String,
    date_text: Option<String>,
    time_text: Option<String>,
) -> Candidate {
    Candidate {
        title,
        description,
        source_name: source_name.to_string(),
        source_url,
        date_text,
        time_text,
    }
}

pub fn fail_if_empty<T>(source_id: &str, items: Vec<T>) -> Result<Vec<T>> {
    if items.is_empty() {
        Err(anyhow!("no candidates scraped for {source_id}"))
    } else {
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).expect("date")
    }

    #[test]
    fn parses_dates_in_several_shapes() {
        assert_eq!(
            parse_date("2025-10-04T18:00:00+02:00", today()),
            NaiveDate::from_ymd_opt(2025, 10, 4)
        );
        assert_eq!(
            parse_date("Sabato 15/11", today()),
            NaiveDate::from_ymd_opt(2025, 11, 15)
        );
        assert_eq!(
            parse_date("sabato 12 luglio", today()),
            NaiveDate::from_ymd_opt(2026, 7, 12)
        );
        assert_eq!(
            parse_date("Venerdì 3 Ottobre 2025, ore 9:30", today()),
            NaiveDate::from_ymd_opt(2025, 10, 3)
        );
        assert_eq!(parse_date("prossimamente", today()), None);
    }

    #[test]
    fn times_inside_date_text_are_not_dates() {
        assert_eq!(
            parse_date("sabato 4 ottobre, ore 10.05", today()),
            NaiveDate::from_ymd_opt(2025, 10, 4)
        );
        assert_eq!(
            parse_date("sabato 4 ottobre ore 18.30", today()),
            NaiveDate::from_ymd_opt(2025, 10, 4)
        );
        assert_eq!(
            parse_date("15/11 dalle 9.30 alle 12.00", today()),
            NaiveDate::from_ymd_opt(2025, 11, 15)
        );
        assert_eq!(parse_date("ritrovo ore 10.05", today()), None);
        assert_eq!(parse_date("h 21.10", today()), None);
    }

    #[test]
    fn invalid_candidates_do_not_hide_later_dates() {
        assert_eq!(
            parse_date("18.30 - 20/09", today()),
            NaiveDate::from_ymd_opt(2025, 9, 20)
        );
        assert_eq!(
            parse_date("31 novembre o 2 dicembre", today()),
            NaiveDate::from_ymd_opt(2025, 12, 2)
        );
        assert_eq!(parse_date("45/13", today()), None);
    }

    #[test]
    fn abbreviated_months_are_understood() {
        assert_eq!(
            parse_date("Sab 22 nov", today()),
            NaiveDate::from_ymd_opt(2025, 11, 22)
        );
        assert_eq!(
            parse_date("mer 8 gen 2025", today()),
            NaiveDate::from_ymd_opt(2025, 1, 8)
        );
        assert_eq!(
            parse_date("Sat 14 Mar", today()),
            NaiveDate::from_ymd_opt(2026, 3, 14)
        );
        assert_eq!(parse_date("3 volte a settimana", today()), None);
    }

    #[test]
    fn parses_times() {
        assert_eq!(parse_time("ore 18:30"), NaiveTime::from_hms_opt(18, 30, 0));
        assert_eq!(parse_time("dalle 9.15 in piazza"), NaiveTime::from_hms_opt(9, 15, 0));
        assert_eq!(parse_time("ritrovo ore 17"), NaiveTime::from_hms_opt(17, 0, 0));
        assert_eq!(parse_time("21h"), NaiveTime::from_hms_opt(21, 0, 0));
        assert_eq!(parse_time("tutto il giorno"), None);
    }

    #[test]
    fn resolves_relative_links() {
        assert_eq!(
            absolute_url("https://example.it/eventi/", Some("/e/1".to_string())).as_deref(),
            Some("https://example.it/e/1")
        );
        assert_eq!(
            absolute_url("https://example.it/", Some("https://other.it/x".to_string())).as_deref(),
            Some("https://other.it/x")
        );
    }
}
