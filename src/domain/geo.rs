//! Coordinates and administrative regions.

use std::fmt;

use super::error::DomainError;

/// Sentinel region returned when reverse geocoding fails.
pub const UNKNOWN_REGION: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Parse query-string values. Only non-numeric or non-finite input is rejected;
    /// range checks are left to the upstream services.
    pub fn parse(lat: &str, lon: &str) -> Result<Self, DomainError> {
        let lat = parse_component(lat, "lat")?;
        let lon = parse_component(lon, "lon")?;
        Ok(Self { lat, lon })
    }
}

fn parse_component(raw: &str, field: &str) -> Result<f64, DomainError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| DomainError::validation(format!("`{field}` must be a number")))?;
    if !value.is_finite() {
        return Err(DomainError::validation(format!("`{field}` must be finite")));
    }
    Ok(value)
}

/// An administrative area name (state, province, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region(String);

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_REGION.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_REGION
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
