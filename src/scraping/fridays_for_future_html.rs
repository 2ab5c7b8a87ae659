use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::base::{self, Fetcher};
use super::SourceScraper;
use crate::models::Candidate;

const URL: &str = "https://fridaysforfutureitalia.it/eventi/";
const SOURCE_ID: &str = "fff_italia";
const SOURCE_NAME: &str = "Fridays For Future Italia";

static CARD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article.evento").expect("fff card selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".evento-titolo").expect("fff title selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".evento-titolo a").expect("fff link selector"));
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".evento-data").expect("fff date selector"));
static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".evento-ora").expect("fff time selector"));
static PLACE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".evento-luogo").expect("fff place selector"));
static DESCRIPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".evento-descrizione").expect("fff description selector"));

pub struct FridaysForFuture;

impl SourceScraper for FridaysForFuture {
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

impl FridaysForFuture {
    pub(crate) fn parse_document(&self, html: &str) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        let mut candidates = Vec::new();

        for card in document.select(&CARD_SELECTOR) {
            let title = match base::first_text(&card, &TITLE_SELECTOR) {
                Some(title) => title,
                None => continue,
            };
            let link = base::absolute_url(URL, base::first_attr(&card, &LINK_SELECTOR, "href"))
                .unwrap_or_else(|| URL.to_string());

            // The place line carries the city and square; keep it in the
            // description so location resolution sees it.
            let description = [
                base::first_text(&card, &PLACE_SELECTOR),
                base::first_text(&card, &DESCRIPTION_SELECTOR),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" - ");

            candidates.push(base::build_candidate(
                SOURCE_NAME,
                link,
                title,
                description,
                base::first_text(&card, &DATE_SELECTOR),
                base::first_text(&card, &TIME_SELECTOR),
            ));
        }

        candidates
    }
}
