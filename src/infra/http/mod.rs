pub mod api;
mod middleware;

pub use api::rate_limit::ApiRateLimiter;
pub use api::{ApiState, build_api_router};
pub use middleware::REQUEST_ID_HEADER;

use axum::{Router, middleware as axum_middleware};

use api::error::ApiError;

/// The full HTTP surface: the JSON API, response logging, and an `x-request-id` on
/// every response.
pub fn build_router(state: ApiState) -> Router {
    build_api_router(state)
        .fallback(|| async { ApiError::not_found("Route not found") })
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::assign_request_id))
}
