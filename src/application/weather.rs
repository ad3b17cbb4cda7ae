use std::sync::Arc;

use tracing::warn;

use crate::application::upstream::{UpstreamError, WeatherProvider};
use crate::domain::geo::Coordinates;
use crate::domain::weather::WeatherReport;

/// Current conditions at a point. Never cached.
#[derive(Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub async fn current(&self, point: Coordinates) -> Result<WeatherReport, UpstreamError> {
        self.provider.current(point).await.inspect_err(|error| {
            if !matches!(error, UpstreamError::NotConfigured(_)) {
                warn!(lat = point.lat, lon = point.lon, error = %error, "Weather lookup failed");
            }
        })
    }
}
