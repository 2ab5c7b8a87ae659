use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::db::{validate, EventStore, StoreError};
use crate::models::Event;

/// Rows per title request; PostgREST caps responses at 1000 rows by default.
const TITLE_PAGE_SIZE: usize = 1000;

/// Hosted Postgres table reached through its PostgREST endpoint.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

#[derive(Debug, Deserialize)]
struct TitleRow {
    title: Option<String>,
}

impl RestStore {
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, StoreError> {
        let (url, key) = match config.supabase() {
            Some(pair) => pair,
            None => return Ok(None),
        };
        let client = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        Ok(Some(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            api_key: key.to_string(),
            table: config.supabase_table.clone(),
        }))
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn title_page(&self, offset: usize, limit: usize) -> Result<Vec<Option<String>>, StoreError> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[
                ("select", "title".to_string()),
                ("order", "id.asc".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        status_to_result(status, &body)?;
        parse_title_rows(&body)
    }
}

impl EventStore for RestStore {
    fn existing_titles(&self) -> Result<Vec<String>, StoreError> {
        let rows = collect_pages(TITLE_PAGE_SIZE, |offset, limit| self.title_page(offset, limit))?;
        Ok(rows.into_iter().flatten().collect())
    }

    fn insert_event(&mut self, event: &Event) -> Result<(), StoreError> {
        validate(event)?;
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(&self.api_key)
            .json(&[event])
            .send()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        status_to_result(status, &body)
    }
}

fn status_to_result(status: StatusCode, body: &str) -> Result<(), StoreError> {
    if status.is_success() {
        return Ok(());
    }
    let detail = format!("status {status}: {body}");
    match status {
        StatusCode::CONFLICT => Err(StoreError::Conflict(detail)),
        s if s.is_client_error() => Err(StoreError::Validation(detail)),
        _ => Err(StoreError::Backend(detail)),
    }
}

/// Requests `page_size` rows at increasing offsets until a short page comes back.
fn collect_pages<T, F>(page_size: usize, mut fetch_page: F) -> Result<Vec<T>, StoreError>
where
    F: FnMut(usize, usize) -> Result<Vec<T>, StoreError>,
{
    let mut rows = Vec::new();
    loop {
        let page = fetch_page(rows.len(), page_size)?;
        let done = page.len() < page_size;
        rows.extend(page);
        if done {
            return Ok(rows);
        }
    }
}

fn parse_title_rows(body: &str) -> Result<Vec<Option<String>>, StoreError> {
    let rows: Vec<TitleRow> =
        serde_json::from_str(body).map_err(|err| StoreError::Backend(err.to_string()))?;
    Ok(rows.into_iter().map(|row| row.title).collect())
}
