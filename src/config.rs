use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::utils;

const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
const DEFAULT_USER_AGENT: &str = "corteo-ingest/0.1 (+https://corteo.app)";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DELAY_MS: u64 = 1100;

/// Everything the ingestion run needs, secrets included. Built once and
/// passed down; nothing else reads the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fallback_city: String,
    pub country_code: String,
    pub country_name: String,
    pub timezone: String,
    pub geocoder_url: String,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub delay_ms: u64,
    pub db_path: Option<PathBuf>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub supabase_table: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fallback_city: "Milano".to_string(),
            country_code: "IT".to_string(),
            country_name: "Italia".to_string(),
            timezone: "Europe/Rome".to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            delay_ms: DEFAULT_DELAY_MS,
            db_path: None,
            supabase_url: None,
            supabase_key: None,
            supabase_table: "events".to_string(),
        }
    }
}

impl AppConfig {
    /// `.env`, then the JSON config file, then process environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        let path = std::env::var("CORTEO_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| utils::config_path());
        let mut config = match read_config(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = ?path, error = %err, "ignoring unreadable config file");
                AppConfig::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("CORTEO_FALLBACK_CITY") {
            self.fallback_city = value;
        }
        if let Some(value) = get("CORTEO_COUNTRY_CODE") {
            self.country_code = value.to_uppercase();
        }
        if let Some(value) = get("CORTEO_COUNTRY_NAME") {
            self.country_name = value;
        }
        if let Some(value) = get("CORTEO_TIMEZONE") {
            self.timezone = value;
        }
        if let Some(value) = get("CORTEO_GEOCODER_URL") {
            self.geocoder_url = value;
        }
        if let Some(value) = get("CORTEO_USER_AGENT") {
            self.user_agent = value;
        }
        if let Some(value) = get("CORTEO_HTTP_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.http_timeout_secs = value;
        }
        if let Some(value) = get("CORTEO_DELAY_MS").and_then(|s| s.parse().ok()) {
            self.delay_ms = value;
        }
        if let Some(value) = get("CORTEO_DB_PATH") {
            self.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = get("SUPABASE_URL") {
            self.supabase_url = Some(value);
        }
        if let Some(value) = get("SUPABASE_KEY") {
            self.supabase_key = Some(value);
        }
        if let Some(value) = get("SUPABASE_TABLE") {
            self.supabase_table = value;
        }
    }

    /// Network timeout, kept within 5..=15 seconds.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http_timeout_secs
                .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
        )
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn tz(&self) -> Tz {
        self.timezone.parse::<Tz>().unwrap_or(chrono_tz::Europe::Rome)
    }

    pub fn database_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(utils::database_path)
    }

    /// URL and key for the hosted store, when both are configured.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }

    pub fn log_summary(&self) {
        fn preview(val: &Option<String>) -> String {
            match val {
                Some(v) if !v.is_empty() => {
                    let shown: String = v.chars().take(5).collect();
                    format!("{shown}...({} chars)", v.chars().count())
                }
                _ => "<not set>".to_string(),
            }
        }

        tracing::info!(
            fallback_city = %self.fallback_city,
            country = %self.country_code,
            geocoder = %self.geocoder_url,
            timeout_secs = self.http_timeout().as_secs(),
            delay_ms = self.delay_ms,
            "config loaded"
        );
        tracing::info!(
            supabase_url = %preview(&self.supabase_url),
            supabase_key = %preview(&self.supabase_key),
            "store credentials"
        );
    }
}

fn read_config(path: &Path) -> Result<AppConfig, String> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| err.to_string())?;
    serde_json::from_str(&contents).map_err(|err| err.to_string())
}
