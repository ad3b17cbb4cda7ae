//! reqwest adapters for the third-party services.

mod nominatim;
mod opentripmap;
mod openweather;

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

pub use nominatim::NominatimClient;
pub use opentripmap::OpenTripMapClient;
pub use openweather::OpenWeatherClient;

use crate::application::upstream::UpstreamError;
use crate::config::UpstreamSettings;

use super::error::InfraError;

pub(crate) const METRIC_UPSTREAM_REQUEST_MS: &str = "tourguard_upstream_request_ms";
pub(crate) const METRIC_UPSTREAM_FAILURE: &str = "tourguard_upstream_failure_total";

/// Shared HTTP client: one connection pool, user agent and request timeout for every
/// upstream adapter.
#[derive(Clone, Debug)]
pub struct UpstreamClient {
    client: Client,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            timeout: settings.request_timeout,
        })
    }

    /// GET `url` and decode a JSON body, recording latency and failures per endpoint.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: Url,
    ) -> Result<T, UpstreamError> {
        let started = Instant::now();
        let result = self.fetch(url).await;

        histogram!(METRIC_UPSTREAM_REQUEST_MS, "endpoint" => endpoint)
            .record(started.elapsed().as_secs_f64() * 1000.0);
        if let Err(error) = &result {
            counter!(METRIC_UPSTREAM_FAILURE, "endpoint" => endpoint).increment(1);
            debug!(endpoint, error = %error, "Upstream request failed");
        }

        result
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.map_error(err))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| self.map_error(err))?;
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        serde_json::from_slice(&bytes).map_err(UpstreamError::malformed)
    }

    fn map_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::transport(err.without_url())
        }
    }
}

/// Join `path` onto `base` and append `params` to the query string.
fn endpoint_url(base: &Url, path: &str, params: &[(&str, &str)]) -> Result<Url, UpstreamError> {
    let mut url = base
        .join(path)
        .map_err(|err| UpstreamError::transport(format!("invalid endpoint `{path}`: {err}")))?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}
