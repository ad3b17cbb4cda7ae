pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use state::ApiState;

use axum::{Router, middleware as axum_middleware, routing::get};

pub fn build_api_router(state: ApiState) -> Router {
    let rate_state = state.clone();

    Router::new()
        .route("/api/location-info", get(handlers::location_info))
        .route("/api/place-geocode", get(handlers::place_geocode))
        .route("/api/place-info", get(handlers::place_info))
        .route("/api/weather", get(handlers::weather))
        .route_layer(axum_middleware::from_fn_with_state(
            rate_state,
            middleware::api_rate_limit,
        ))
        .route("/api/health", get(handlers::health))
        .with_state(state)
}
