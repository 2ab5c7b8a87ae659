use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use dirs::data_dir;
use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let root = base.join("corteo");
    if let Err(err) = fs::create_dir_all(&root) {
        tracing::warn!(path = ?root, error = %err, "failed to create data root");
    }
    root
});

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

pub fn database_path() -> PathBuf {
    data_root().join("corteo.sqlite")
}

pub fn config_path() -> PathBuf {
    data_root().join("config.json")
}

pub fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!(path = ?parent, error = %err, "failed to create parent");
        }
    }
}

/// Calendar date right now in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Spaces out calls to a remote service. The first call never waits.
#[derive(Debug)]
pub struct Pacer {
    window: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn wait(&mut self) {
        if let Some(previous) = self.last {
            let elapsed = previous.elapsed();
            if elapsed < self.window {
                thread::sleep(self.window - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}
