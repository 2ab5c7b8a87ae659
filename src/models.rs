use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Closed category taxonomy. Declaration order is the classifier priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Environment,
    Lgbtq,
    Labor,
    CivilHumanRights,
    PeaceAntiWar,
    WomensRights,
    RacialSocialJustice,
    HealthcareEducation,
    TransparencyAntiCorruption,
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Environment,
        Category::Lgbtq,
        Category::Labor,
        Category::CivilHumanRights,
        Category::PeaceAntiWar,
        Category::WomensRights,
        Category::RacialSocialJustice,
        Category::HealthcareEducation,
        Category::TransparencyAntiCorruption,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Environment => "Environment",
            Category::Lgbtq => "LGBTQ+",
            Category::Labor => "Labor",
            Category::CivilHumanRights => "Civil & Human Rights",
            Category::PeaceAntiWar => "Peace & Anti-War",
            Category::WomensRights => "Women's Rights",
            Category::RacialSocialJustice => "Racial & Social Justice",
            Category::HealthcareEducation => "Healthcare & Education",
            Category::TransparencyAntiCorruption => "Transparency & Anti-Corruption",
            Category::Other => "Other",
        }
    }

    /// Case-insensitive lookup by label; anything unknown is `Other`.
    pub fn from_label(label: &str) -> Self {
        let wanted = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.label().eq_ignore_ascii_case(wanted))
            .unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::from_label(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Protest,
    Rally,
    Assembly,
    Workshop,
    Meeting,
    Talk,
    Training,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 8] = [
        EventType::Protest,
        EventType::Rally,
        EventType::Assembly,
        EventType::Workshop,
        EventType::Meeting,
        EventType::Talk,
        EventType::Training,
        EventType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EventType::Protest => "Protest",
            EventType::Rally => "Rally",
            EventType::Assembly => "Assembly",
            EventType::Workshop => "Workshop",
            EventType::Meeting => "Meeting",
            EventType::Talk => "Talk",
            EventType::Training => "Training",
            EventType::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Self {
        let wanted = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.label().eq_ignore_ascii_case(wanted))
            .unwrap_or(EventType::Other)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for EventType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EventType::from_label(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// A raw scraped item before it becomes an [`Event`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub description: String,
    pub source_name: String,
    pub source_url: String,
    pub date_text: Option<String>,
    pub time_text: Option<String>,
}

impl Candidate {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.source_name = name.into();
        self.source_url = url.into();
        self
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String, // sha256: source_name|title|date
    pub title: String,
    pub description: String,
    pub category: Category,
    pub event_type: EventType,
    pub city: String,
    pub address: String,
    pub coordinates: Coordinates,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub source_name: String,
    pub source_url: String,
    pub country_code: String,
    pub scraped_at_utc: String,
}
