//! Response types shared between the tourguard server and its clients.
//!
//! Field names follow the JSON the browser front end already consumes, so
//! several fields are renamed on the wire (`xid`, `img`, `windSpeed`, ...).

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair as reported by the places directory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// An enriched point of interest returned by `/api/location-info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    #[serde(rename = "xid")]
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "img")]
    pub image_url: Option<String>,
    pub description: String,
}

/// Body of `GET /api/location-info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfoResponse {
    pub state: String,
    pub places: Vec<PlaceSummary>,
}

/// A raw radius-search hit, passed through without enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xid: Option<String>,
    pub name: String,
    pub rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<GeoPoint>,
}

/// Body of `GET /api/place-geocode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSearchResponse {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub attractions: Vec<Attraction>,
}

/// Body of `GET /api/place-info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceInfoResponse {
    pub xid: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub description: String,
    pub img: Option<String>,
    pub best_time: Option<String>,
    pub photos: Vec<String>,
}

/// Body of `GET /api/weather`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResponse {
    pub weather: String,
    pub condition: String,
    pub temp: f64,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
