use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::application::upstream::{UpstreamError, WeatherProvider};
use crate::domain::geo::Coordinates;
use crate::domain::weather::WeatherReport;

use super::{UpstreamClient, endpoint_url};

/// Current weather from OpenWeatherMap, in metric units.
#[derive(Clone, Debug)]
pub struct OpenWeatherClient {
    http: UpstreamClient,
    base_url: Url,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(http: UpstreamClient, base_url: Url, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    #[serde(default)]
    weather: Vec<Condition>,
    main: Readings,
    #[serde(default)]
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Readings {
    temp: f64,
    #[serde(default)]
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Wind {
    #[serde(default)]
    speed: Option<f64>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, point: Coordinates) -> Result<WeatherReport, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("weather API key"))?;
        let lat = point.lat.to_string();
        let lon = point.lon.to_string();
        let url = endpoint_url(
            &self.base_url,
            "weather",
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", "metric"),
            ],
        )?;

        let body: CurrentWeather = self.http.get_json("openweather.current", url).await?;
        let condition = body
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::malformed("response has no weather conditions"))?;

        Ok(WeatherReport {
            main: condition.main,
            description: condition.description,
            temperature: body.main.temp,
            humidity: body.main.humidity,
            wind_speed: body.wind.and_then(|wind| wind.speed),
        })
    }
}
