//! Ports to the third-party services the location pipeline depends on.

use std::{fmt::Display, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::geo::Coordinates;
use crate::domain::places::{Candidate, PlaceDetails};
use crate::domain::weather::WeatherReport;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("upstream responded with status {status}")]
    Status { status: u16 },
    #[error("malformed upstream response: {0}")]
    Malformed(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl UpstreamError {
    pub fn transport(err: impl Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn malformed(err: impl Display) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Parameters of a radius search around a point.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusQuery {
    pub center: Coordinates,
    pub radius_meters: u32,
    pub kinds: String,
    pub min_rating: u8,
    pub limit: u32,
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Administrative region containing `point`. `Ok(None)` when the answer has no region.
    async fn region_for(&self, point: Coordinates) -> Result<Option<String>, UpstreamError>;
}

#[async_trait]
pub trait PlacesDirectory: Send + Sync {
    /// Centre of a named place or area, if the directory knows it.
    async fn geocode(&self, name: &str) -> Result<Option<Coordinates>, UpstreamError>;

    async fn radius_search(&self, query: &RadiusQuery) -> Result<Vec<Candidate>, UpstreamError>;

    async fn details(&self, id: &str) -> Result<PlaceDetails, UpstreamError>;

    /// Best fuzzy match for a place name.
    async fn autosuggest(&self, name: &str) -> Result<Option<Candidate>, UpstreamError>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, point: Coordinates) -> Result<WeatherReport, UpstreamError>;
}
