use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::location::cities::KNOWN_CITIES;

pub const FALLBACK_TITLE_CHARS: usize = 200;

static LEADING_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d{1,2})[/.\-](\d{1,2})(?:[/.\-](\d{4}|\d{2}))?(?:\s*[-–—:|,]\s*|\s+|$)")
        .expect("leading date regex")
});
static LEADING_PLACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:piazza|piazzale|p\.zza|via|viale|corso|largo)\s+[^-–—]{1,60}?\s*[-–—]\s*")
        .expect("leading place regex")
});
static CITY_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-–—]\s*").expect("city separator regex"));

const QUOTE_PAIRS: [(char, char); 5] = [
    ('"', '"'),
    ('\'', '\''),
    ('“', '”'),
    ('«', '»'),
    ('‘', '’'),
];

/// Strips leading dates, a leading city or street phrase and wrapping
/// quotes, then collapses whitespace and capitalizes the first letter.
/// Never fails; the result may be empty.
pub fn normalize_title(raw: &str) -> String {
    let mut current = collapse_whitespace(raw);
    loop {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    capitalize_first(&current)
}

/// Normalized title, or the start of the description (then the source name)
/// when normalization leaves nothing.
pub fn title_or_fallback(raw_title: &str, description: &str, source_name: &str) -> String {
    let title = normalize_title(raw_title);
    if !title.is_empty() {
        return title;
    }
    for fallback in [description, raw_title, source_name] {
        let cleaned = collapse_whitespace(fallback);
        let truncated: String = cleaned.chars().take(FALLBACK_TITLE_CHARS).collect();
        let truncated = truncated.trim();
        if !truncated.is_empty() {
            return capitalize_first(truncated);
        }
    }
    "Evento".to_string()
}

/// Date carried by a leading `DD/MM[/YYYY]` token. Yearless dates land in
/// `today`'s year, or the next one if already past.
pub fn leading_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let trimmed = raw.trim_start_matches(|c: char| c.is_whitespace() || is_quote(c));
    let caps = LEADING_DATE_RE.captures(trimmed)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    match caps.get(3) {
        Some(year) => {
            let mut year: i32 = year.as_str().parse().ok()?;
            if year < 100 {
                year += 2000;
            }
            NaiveDate::from_ymd_opt(year, month, day)
        }
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

pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercases and strips Latin diacritics, one output char per input char.
pub fn fold(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            let lower = c.to_lowercase().next().unwrap_or(c);
            match lower {
                'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
                'è' | 'é' | 'ê' | 'ë' => 'e',
                'ì' | 'í' | 'î' | 'ï' => 'i',
                'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
                'ù' | 'ú' | 'û' | 'ü' => 'u',
                'ç' => 'c',
                'ñ' => 'n',
                '’' | '‘' => '\'',
                other => other,
            }
        })
        .collect()
}

/// `needle` occurs in `haystack` bounded by non-alphanumerics on both sides.
/// Both arguments are expected to be folded already.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    find_word(haystack, needle, true)
}

/// Like [`contains_word`] but only the start must sit on a word boundary.
pub fn contains_word_prefix(haystack: &str, needle: &str) -> bool {
    find_word(haystack, needle, false)
}

fn find_word(haystack: &str, needle: &str, whole: bool) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = !whole
            || haystack[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

fn strip_once(input: &str) -> String {
    let text = input.trim();
    if let Some(inner) = strip_wrapping_quotes(text) {
        return inner.trim().to_string();
    }
    if let Some(caps) = LEADING_DATE_RE.captures(text) {
        let plausible = caps
            .get(1)
            .zip(caps.get(2))
            .and_then(|(d, m)| Some((d.as_str().parse::<u32>().ok()?, m.as_str().parse::<u32>().ok()?)))
            .map_or(false, |(day, month)| (1..=31).contains(&day) && (1..=12).contains(&month));
        if plausible {
            return text[caps.get(0).map_or(0, |m| m.end())..].trim().to_string();
        }
    }
    if let Some(rest) = strip_leading_city(text) {
        return rest;
    }
    if let Some(found) = LEADING_PLACE_RE.find(text) {
        return text[found.end()..].trim().to_string();
    }
    text.to_string()
}

fn strip_wrapping_quotes(text: &str) -> Option<&str> {
    let first = text.chars().next()?;
    let last = text.chars().next_back()?;
    if text.chars().count() < 2 {
        return None;
    }
    QUOTE_PAIRS
        .iter()
        .find(|(open, close)| first == *open && last == *close)
        .map(|_| &text[first.len_utf8()..text.len() - last.len_utf8()])
}

fn strip_leading_city(text: &str) -> Option<String> {
    let folded = fold(text);
    for city in KNOWN_CITIES {
        for name in city.names() {
            let folded_name = fold(name);
            if !folded.starts_with(&folded_name) {
                continue;
            }
            // fold() is char-for-char, so char offsets line up with `text`.
            let split = text
                .char_indices()
                .nth(folded_name.chars().count())
                .map_or(text.len(), |(idx, _)| idx);
            let rest = &text[split..];
            if let Some(sep) = CITY_SEPARATOR_RE.find(rest) {
                return Some(rest[sep.end()..].trim().to_string());
            }
        }
    }
    None
}

fn is_quote(c: char) -> bool {
    QUOTE_PAIRS.iter().any(|(open, close)| c == *open || c == *close)
}

fn capitalize_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
