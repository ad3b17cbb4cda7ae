use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::application::upstream::{ReverseGeocoder, UpstreamError};
use crate::domain::geo::Coordinates;

use super::{UpstreamClient, endpoint_url};

/// Reverse geocoding against a Nominatim instance.
#[derive(Clone, Debug)]
pub struct NominatimClient {
    http: UpstreamClient,
    base_url: Url,
}

impl NominatimClient {
    pub fn new(http: UpstreamClient, base_url: Url) -> Self {
        Self { http, base_url }
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    state: Option<String>,
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn region_for(&self, point: Coordinates) -> Result<Option<String>, UpstreamError> {
        let lat = point.lat.to_string();
        let lon = point.lon.to_string();
        let url = endpoint_url(
            &self.base_url,
            "reverse",
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "json"),
                ("addressdetails", "1"),
            ],
        )?;

        let body: ReverseResponse = self.http.get_json("nominatim.reverse", url).await?;
        Ok(body.address.and_then(|address| address.state))
    }
}
