use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::application::upstream::{PlacesDirectory, RadiusQuery, UpstreamError};
use crate::domain::geo::Coordinates;
use crate::domain::places::{Candidate, PlaceDetails};

use super::{UpstreamClient, endpoint_url};

/// Places directory backed by the OpenTripMap API.
#[derive(Clone, Debug)]
pub struct OpenTripMapClient {
    http: UpstreamClient,
    base_url: Url,
    api_key: Option<String>,
}

impl OpenTripMapClient {
    pub fn new(http: UpstreamClient, base_url: Url, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("OpenTripMap API key"))?;
        let mut url = endpoint_url(&self.base_url, path, params)?;
        url.query_pairs_mut().append_pair("apikey", api_key);
        Ok(url)
    }
}

/// Either half may be missing on individual hits.
#[derive(Debug, Deserialize)]
struct WirePoint {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl WirePoint {
    fn coordinates(self) -> Option<Coordinates> {
        Some(Coordinates::new(self.lat?, self.lon?))
    }
}

#[derive(Debug, Deserialize)]
struct GeonameResponse {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// `rate` is a number in JSON output but a string such as `"3h"` in some responses.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireRating {
    Number(f64),
    Text(String),
}

impl WireRating {
    fn value(&self) -> Option<f64> {
        match self {
            WireRating::Number(value) => Some(*value),
            WireRating::Text(text) => text.trim().trim_end_matches('h').parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RadiusItem {
    #[serde(default)]
    xid: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rate: Option<WireRating>,
    #[serde(default)]
    kinds: Option<String>,
    #[serde(default)]
    dist: Option<f64>,
    #[serde(default)]
    point: Option<WirePoint>,
}

impl From<RadiusItem> for Candidate {
    fn from(item: RadiusItem) -> Self {
        Candidate {
            id: item.xid,
            name: item.name,
            rating: item.rate.as_ref().and_then(WireRating::value),
            kinds: item.kinds,
            distance: item.dist,
            point: item.point.and_then(WirePoint::coordinates),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SourceRef {
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextRef {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoRef {
    #[serde(default)]
    descr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    xid: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    point: Option<WirePoint>,
    #[serde(default)]
    preview: Option<SourceRef>,
    #[serde(default)]
    wikipedia_extracts: Option<TextRef>,
    #[serde(default)]
    info: Option<InfoRef>,
    #[serde(default)]
    images: Vec<SourceRef>,
}

impl From<DetailsResponse> for PlaceDetails {
    fn from(details: DetailsResponse) -> Self {
        PlaceDetails {
            id: details.xid,
            name: details.name,
            point: details.point.and_then(WirePoint::coordinates),
            preview_url: details.preview.and_then(|preview| preview.source),
            extract: details.wikipedia_extracts.and_then(|extract| extract.text),
            info_description: details.info.and_then(|info| info.descr),
            images: details
                .images
                .into_iter()
                .filter_map(|image| image.source)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SuggestCollection {
    #[serde(default)]
    features: Vec<SuggestFeature>,
}

#[derive(Debug, Deserialize)]
struct SuggestFeature {
    properties: RadiusItem,
    #[serde(default)]
    geometry: Option<SuggestGeometry>,
}

/// GeoJSON order: `[lon, lat]`.
#[derive(Debug, Deserialize)]
struct SuggestGeometry {
    coordinates: (f64, f64),
}

#[async_trait]
impl PlacesDirectory for OpenTripMapClient {
    async fn geocode(&self, name: &str) -> Result<Option<Coordinates>, UpstreamError> {
        let url = self.url("places/geoname", &[("name", name)])?;
        let body: GeonameResponse = match self.http.get_json("opentripmap.geoname", url).await {
            Ok(body) => body,
            Err(UpstreamError::Status { status: 404 }) => return Ok(None),
            Err(error) => return Err(error),
        };

        Ok(match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        })
    }

    async fn radius_search(&self, query: &RadiusQuery) -> Result<Vec<Candidate>, UpstreamError> {
        let lat = query.center.lat.to_string();
        let lon = query.center.lon.to_string();
        let radius = query.radius_meters.to_string();
        let rate = query.min_rating.to_string();
        let limit = query.limit.to_string();
        let url = self.url(
            "places/radius",
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("radius", radius.as_str()),
                ("kinds", query.kinds.as_str()),
                ("rate", rate.as_str()),
                ("limit", limit.as_str()),
                ("format", "json"),
            ],
        )?;

        let items: Vec<serde_json::Value> = self.http.get_json("opentripmap.radius", url).await?;
        Ok(decode_radius_items(items))
    }

    async fn details(&self, id: &str) -> Result<PlaceDetails, UpstreamError> {
        let mut url = self.url("places/xid/", &[])?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::transport("places base url cannot take path segments"))?
            .pop_if_empty()
            .push(id);

        let details: DetailsResponse = self.http.get_json("opentripmap.details", url).await?;
        Ok(details.into())
    }

    async fn autosuggest(&self, name: &str) -> Result<Option<Candidate>, UpstreamError> {
        let url = self.url("places/autosuggest", &[("name", name)])?;
        let body: SuggestCollection = self.http.get_json("opentripmap.autosuggest", url).await?;

        Ok(body.features.into_iter().next().map(|feature| {
            let geometry = feature.geometry;
            let mut candidate = Candidate::from(feature.properties);
            if candidate.point.is_none() {
                candidate.point = geometry.map(|geometry| {
                    let (lon, lat) = geometry.coordinates;
                    Coordinates::new(lat, lon)
                });
            }
            candidate
        }))
    }
}

/// Decode each hit on its own so one malformed entry does not discard the rest.
fn decode_radius_items(items: Vec<serde_json::Value>) -> Vec<Candidate> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RadiusItem>(item) {
            Ok(item) => Some(Candidate::from(item)),
            Err(err) => {
                debug!(error = %err, "Skipping undecodable radius hit");
                None
            }
        })
        .collect()
}
