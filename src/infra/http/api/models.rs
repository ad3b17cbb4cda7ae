//! Conversions from domain values to the wire types in `tourguard-api-types`.

use tourguard_api_types as wire;

use crate::application::location::LocationInfo;
use crate::domain::geo::Coordinates;
use crate::domain::places::{PlaceInfo, PlaceSummary, RankedPlace, SearchResult};
use crate::domain::weather::WeatherReport;

impl From<Coordinates> for wire::GeoPoint {
    fn from(point: Coordinates) -> Self {
        wire::GeoPoint {
            lat: point.lat,
            lon: point.lon,
        }
    }
}

impl From<PlaceSummary> for wire::PlaceSummary {
    fn from(place: PlaceSummary) -> Self {
        wire::PlaceSummary {
            id: place.id,
            name: place.name,
            lat: place.lat,
            lon: place.lon,
            image_url: place.image_url,
            description: place.description,
        }
    }
}

impl From<LocationInfo> for wire::LocationInfoResponse {
    fn from(info: LocationInfo) -> Self {
        wire::LocationInfoResponse {
            state: info.region.into_string(),
            places: info.places.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<RankedPlace> for wire::Attraction {
    fn from(place: RankedPlace) -> Self {
        wire::Attraction {
            xid: place.id,
            name: place.name,
            rate: place.rating,
            kinds: place.kinds,
            dist: place.distance,
            point: place.point.map(Into::into),
        }
    }
}

impl From<SearchResult> for wire::PlaceSearchResponse {
    fn from(result: SearchResult) -> Self {
        wire::PlaceSearchResponse {
            name: result.query_name,
            lat: result.center.lat,
            lon: result.center.lon,
            attractions: result.attractions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<PlaceInfo> for wire::PlaceInfoResponse {
    fn from(info: PlaceInfo) -> Self {
        wire::PlaceInfoResponse {
            xid: info.id,
            name: info.name,
            lat: info.point.map(|point| point.lat),
            lon: info.point.map(|point| point.lon),
            description: info.description,
            img: info.image_url,
            best_time: None,
            photos: info.photos,
        }
    }
}

impl From<WeatherReport> for wire::WeatherResponse {
    fn from(report: WeatherReport) -> Self {
        wire::WeatherResponse {
            weather: report.main,
            condition: report.description,
            temp: report.temperature,
            humidity: report.humidity,
            wind_speed: report.wind_speed,
        }
    }
}
