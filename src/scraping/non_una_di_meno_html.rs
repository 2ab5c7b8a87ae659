use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::base::{self, Fetcher};
use super::SourceScraper;
use crate::models::Candidate;

const URL: &str = "https://nonunadimeno.wordpress.com/agenda/";
const SOURCE_ID: &str = "non_una_di_meno";
const SOURCE_NAME: &str = "Non Una Di Meno";

static ENTRY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article.post").expect("nudm entry selector"));
static TITLE_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2.entry-title a").expect("nudm title selector"));
static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time.event-date").expect("nudm time selector"));
static SUMMARY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".entry-summary p").expect("nudm summary selector"));

pub struct NonUnaDiMeno;

impl SourceScraper for NonUnaDiMeno {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn url(&self) -> &'static str {
        URL
    }

    fn fetch(&self, fetcher: &dyn Fetcher) -> Result<Vec<Candidate>> {
        let html = fetcher.fetch_html(URL)?;
        base::fail_if_empty(SOURCE_ID, self.parse_document(&html))
    }
}

impl NonUnaDiMeno {
    pub(crate) fn parse_document(&self, html: &str) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        let mut candidates = Vec::new();

        for entry in document.select(&ENTRY_SELECTOR) {
            let link = match entry.select(&TITLE_LINK_SELECTOR).next() {
                Some(link) => link,
                None => continue,
            };
            let title = base::inner_text(link);
            if title.is_empty() {
                continue;
            }
            let url = base::absolute_url(URL, link.value().attr("href").map(str::to_string))
                .unwrap_or_else(|| URL.to_string());

            // Prefer the machine-readable attribute; the visible text is often "Sab 8 mar".
            let time_node = entry.select(&TIME_SELECTOR).next();
            let machine = time_node
                .and_then(|node| node.value().attr("datetime"))
                .map(str::to_string);
            let visible = time_node
                .map(base::inner_text)
                .filter(|text| !text.is_empty());
            let time_text = machine
                .as_deref()
                .and_then(|text| text.split_once('T'))
                .map(|(_, time)| time.to_string())
                .or_else(|| visible.clone());
            let date_text = machine.or(visible);

            let description = entry
                .select(&SUMMARY_SELECTOR)
                .map(base::inner_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            candidates.push(base::build_candidate(
                SOURCE_NAME,
                url,
                title,
                description,
                date_text,
                time_text,
            ));
        }

        candidates
    }
}
