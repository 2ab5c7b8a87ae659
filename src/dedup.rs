use std::collections::HashSet;

/// Length of the lowercased title prefix used as dedup key.
pub const DEDUP_KEY_CHARS: usize = 50;

/// Shortest key that may match another key by prefix alone (truncated previews).
pub const MIN_PREFIX_MATCH_CHARS: usize = 30;

/// Lowercased, whitespace-collapsed title cut to [`DEDUP_KEY_CHARS`], with
/// trailing ellipses and punctuation dropped.
pub fn dedup_key(title: &str) -> String {
    let lowered = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let truncated: String = lowered.chars().take(DEDUP_KEY_CHARS).collect();
    truncated
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

/// True when `title` shares its key with one of `existing_keys`, or when one
/// key is a long enough prefix of the other. Entries are re-keyed, so raw
/// titles work as well as keys.
pub fn is_duplicate(title: &str, existing_keys: &HashSet<String>) -> bool {
    let key = dedup_key(title);
    if key.is_empty() {
        return false;
    }
    if existing_keys.contains(&key) {
        return true;
    }
    existing_keys.iter().any(|existing| {
        let other = dedup_key(existing);
        other == key || prefix_match(&key, &other)
    })
}

fn prefix_match(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    short.chars().count() >= MIN_PREFIX_MATCH_CHARS && long.starts_with(short)
}

/// Append-only set of seen dedup keys for one batch run.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new<I, S>(existing_titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seen = existing_titles
            .into_iter()
            .map(|title| dedup_key(title.as_ref()))
            .filter(|key| !key.is_empty())
            .collect();
        Self { seen }
    }

    pub fn is_duplicate(&self, title: &str) -> bool {
        is_duplicate(title, &self.seen)
    }

    pub fn remember(&mut self, title: &str) {
        let key = dedup_key(title);
        if !key.is_empty() {
            self.seen.insert(key);
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
