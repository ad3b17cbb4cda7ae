use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

const TARGET: &str = "tourguard::http::response";
const MAX_REQUEST_ID_LEN: usize = 128;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation id of one request, echoed back in `x-request-id`.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Set on a successful response whose body was built from a fallback because an
/// upstream lookup failed. Holds the lookup that degraded.
#[derive(Clone, Copy, Debug)]
pub struct DegradedLookup(pub &'static str);

/// Reuse a well-formed inbound `x-request-id`, otherwise mint a uuid, and return it on
/// the response.
pub async fn assign_request_id(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let query = request.uri().query().unwrap_or("").to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();

    if status.is_client_error() || status.is_server_error() {
        let (source, messages) = match response.extensions_mut().remove::<ErrorReport>() {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target: TARGET,
                status = status.as_u16(),
                method = %method,
                route = %route,
                query = %query,
                elapsed_ms,
                source,
                detail = %detail,
                chain = ?messages,
                request_id = %request_id,
                "request failed",
            );
        } else {
            warn!(
                target: TARGET,
                status = status.as_u16(),
                method = %method,
                route = %route,
                query = %query,
                elapsed_ms,
                source,
                detail = %detail,
                request_id = %request_id,
                "client request error",
            );
        }
    } else if let Some(DegradedLookup(lookup)) = response.extensions().get::<DegradedLookup>() {
        warn!(
            target: TARGET,
            status = status.as_u16(),
            method = %method,
            route = %route,
            elapsed_ms,
            degraded = *lookup,
            request_id = %request_id,
            "request served with degraded upstream data",
        );
    } else {
        debug!(
            target: TARGET,
            status = status.as_u16(),
            method = %method,
            route = %route,
            elapsed_ms,
            request_id = %request_id,
            "request served",
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn router() -> Router {
        Router::new()
            .route(
                "/echo",
                get(|request: Request<Body>| async move {
                    request
                        .extensions()
                        .get::<RequestId>()
                        .map(|id| id.0.clone())
                        .unwrap_or_default()
                }),
            )
            .layer(middleware::from_fn(assign_request_id))
    }

    #[tokio::test]
    async fn handler_sees_the_id_returned_to_the_client() {
        let response = router()
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let header = response
            .headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .expect("request id header");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(header.as_bytes(), body.as_ref());
        assert!(Uuid::parse_str(&header).is_ok());
    }

    #[tokio::test]
    async fn oversized_inbound_id_is_replaced() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header(REQUEST_ID_HEADER, "x".repeat(MAX_REQUEST_ID_LEN + 1))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        let header = response
            .headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .expect("request id header");
        assert!(Uuid::parse_str(header).is_ok());
    }
}
