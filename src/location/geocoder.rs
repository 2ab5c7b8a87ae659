use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::Coordinates;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoder timed out")]
    Timeout,
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Shape returned alongside a geocoder hit. Vertices are `Coordinates`,
/// not GeoJSON `[lon, lat]` pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinates),
    LineString(Vec<Coordinates>),
    MultiLineString(Vec<Vec<Coordinates>>),
    Polygon(Vec<Vec<Coordinates>>),
    MultiPolygon(Vec<Vec<Vec<Coordinates>>>),
}

#[derive(Debug, Clone)]
pub struct GeocodeHit {
    /// Reference point chosen by the service.
    pub point: Coordinates,
    pub geometry: Option<Geometry>,
    pub display_name: String,
}

pub trait Geocoder {
    /// `Ok(None)` means the service answered with zero results.
    fn geocode(&self, query: &str) -> Result<Option<GeocodeHit>, GeocodeError>;
}

impl<T: Geocoder + ?Sized> Geocoder for &T {
    fn geocode(&self, query: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
        (**self).geocode(query)
    }
}

impl<T: Geocoder + ?Sized> Geocoder for Box<T> {
    fn geocode(&self, query: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
        (**self).geocode(query)
    }
}

/// OpenStreetMap Nominatim search client.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
    country_code: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    geojson: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl NominatimGeocoder {
    pub fn new(
        endpoint: &str,
        country_code: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|err| GeocodeError::Http(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            country_code: country_code.to_lowercase(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GeocodeError> {
        Self::new(
            &config.geocoder_url,
            &config.country_code,
            &config.user_agent,
            config.http_timeout(),
        )
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", "1"),
                ("polygon_geojson", "1"),
                ("countrycodes", self.country_code.as_str()),
            ])
            .send()
            .map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.text().map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(GeocodeError::Http(format!("status {status}: {body}")));
        }
        parse_search_response(&body)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GeocodeError {
    if err.is_timeout() {
        GeocodeError::Timeout
    } else {
        GeocodeError::Http(err.to_string())
    }
}

pub(crate) fn parse_search_response(body: &str) -> Result<Option<GeocodeHit>, GeocodeError> {
    let results: Vec<SearchResult> =
        serde_json::from_str(body).map_err(|err| GeocodeError::Parse(err.to_string()))?;
    let first = match results.into_iter().next() {
        Some(first) => first,
        None => return Ok(None),
    };

    let lat: f64 = first
        .lat
        .parse()
        .map_err(|_| GeocodeError::Parse(format!("bad latitude {:?}", first.lat)))?;
    let lon: f64 = first
        .lon
        .parse()
        .map_err(|_| GeocodeError::Parse(format!("bad longitude {:?}", first.lon)))?;

    Ok(Some(GeocodeHit {
        point: Coordinates::new(lat, lon),
        geometry: first.geojson.and_then(convert_geometry),
        display_name: first.display_name,
    }))
}

/// Unsupported or malformed shapes are dropped; the reference point remains.
fn convert_geometry(raw: RawGeometry) -> Option<Geometry> {
    fn ring(points: Vec<[f64; 2]>) -> Vec<Coordinates> {
        points
            .into_iter()
            .map(|[lon, lat]| Coordinates::new(lat, lon))
            .collect()
    }

    match raw.kind.as_str() {
        "Point" => {
            let [lon, lat]: [f64; 2] = serde_json::from_value(raw.coordinates).ok()?;
            Some(Geometry::Point(Coordinates::new(lat, lon)))
        }
        "LineString" => {
            let line: Vec<[f64; 2]> = serde_json::from_value(raw.coordinates).ok()?;
            Some(Geometry::LineString(ring(line)))
        }
        "MultiLineString" => {
            let lines: Vec<Vec<[f64; 2]>> = serde_json::from_value(raw.coordinates).ok()?;
            Some(Geometry::MultiLineString(lines.into_iter().map(ring).collect()))
        }
        "Polygon" => {
            let rings: Vec<Vec<[f64; 2]>> = serde_json::from_value(raw.coordinates).ok()?;
            Some(Geometry::Polygon(rings.into_iter().map(ring).collect()))
        }
        "MultiPolygon" => {
            let polygons: Vec<Vec<Vec<[f64; 2]>>> =
                serde_json::from_value(raw.coordinates).ok()?;
            Some(Geometry::MultiPolygon(
                polygons
                    .into_iter()
                    .map(|rings| rings.into_iter().map(ring).collect())
                    .collect(),
            ))
        }
        _ => None,
    }
}
