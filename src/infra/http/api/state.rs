use std::sync::Arc;

use crate::application::location::LocationService;
use crate::application::place_info::PlaceInfoService;
use crate::application::search::PlaceSearch;
use crate::application::weather::WeatherService;

use super::rate_limit::ApiRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub location: Arc<LocationService>,
    pub search: Arc<PlaceSearch>,
    pub place_info: Arc<PlaceInfoService>,
    pub weather: Arc<WeatherService>,
    pub rate_limiter: Arc<ApiRateLimiter>,
}
