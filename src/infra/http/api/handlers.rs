use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tourguard_api_types as wire;

use crate::application::place_info::PlaceInfoError;
use crate::application::search::PlaceSearchOutcome;
use crate::application::upstream::UpstreamError;
use crate::domain::geo::Coordinates;

use crate::infra::http::middleware::DegradedLookup;

use super::error::ApiError;
use super::state::ApiState;

#[derive(Debug, Deserialize)]
pub struct CoordinatesQuery {
    pub lat: Option<String>,
    #[serde(alias = "lng")]
    pub lon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

pub async fn location_info(
    State(state): State<ApiState>,
    query: Result<Query<CoordinatesQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let point = coordinates(query)?;
    let info = state.location.location_info(point).await;
    let unknown_region = info.region.is_unknown();

    let mut response = Json(wire::LocationInfoResponse::from(info)).into_response();
    if unknown_region {
        response.extensions_mut().insert(DegradedLookup("region"));
    }
    Ok(response)
}

pub async fn place_geocode(
    State(state): State<ApiState>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let name = place_name(query)?;

    match state.search.search_by_name(&name).await {
        PlaceSearchOutcome::Found(result) => Ok(Json(wire::PlaceSearchResponse::from(result))),
        PlaceSearchOutcome::NotFound => Err(ApiError::not_found("Place not found")),
        PlaceSearchOutcome::Unavailable => Err(ApiError::bad_gateway(
            "Place search is temporarily unavailable",
        )),
    }
}

pub async fn place_info(
    State(state): State<ApiState>,
    query: Result<Query<NameQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let name = place_name(query)?;

    match state.place_info.place_info(&name).await {
        Ok(info) => Ok(Json(wire::PlaceInfoResponse::from(info))),
        Err(PlaceInfoError::NotFound(_)) => Err(ApiError::not_found("Place not found")),
        Err(PlaceInfoError::Upstream(error @ UpstreamError::NotConfigured(_))) => Err(
            ApiError::not_configured(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Place directory is not configured",
            )
            .with_detail(error.to_string()),
        ),
        Err(PlaceInfoError::Upstream(error)) => Err(ApiError::bad_gateway(
            "Failed to fetch place details",
        )
        .with_detail(error.to_string())),
    }
}

pub async fn weather(
    State(state): State<ApiState>,
    query: Result<Query<CoordinatesQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let point = coordinates(query)?;

    match state.weather.current(point).await {
        Ok(report) => Ok(Json(wire::WeatherResponse::from(report))),
        Err(error @ UpstreamError::NotConfigured(_)) => Err(ApiError::not_configured(
            StatusCode::SERVICE_UNAVAILABLE,
            "No weather API key configured",
        )
        .with_detail(error.to_string())),
        Err(error) => Err(
            ApiError::bad_gateway("Failed to fetch weather data").with_detail(error.to_string()),
        ),
    }
}

pub async fn health() -> impl IntoResponse {
    Json(wire::HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn coordinates(
    query: Result<Query<CoordinatesQuery>, QueryRejection>,
) -> Result<Coordinates, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::bad_request("Invalid query string", Some(rejection.body_text()))
    })?;

    let (Some(lat), Some(lon)) = (query.lat, query.lon) else {
        return Err(ApiError::bad_request("lat and lon are required", None));
    };

    Coordinates::parse(&lat, &lon).map_err(|err| {
        ApiError::bad_request("lat and lon must be numbers", Some(err.to_string()))
    })
}

fn place_name(query: Result<Query<NameQuery>, QueryRejection>) -> Result<String, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        ApiError::bad_request("Invalid query string", Some(rejection.body_text()))
    })?;

    query
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("name is required", None))
}
