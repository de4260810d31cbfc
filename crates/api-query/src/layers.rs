use axum::http::HeaderMap;
use axum::{middleware::Next, response::Response};
use http::header::{CONTENT_TYPE, InvalidHeaderValue};
use http::{HeaderName, HeaderValue, Method};
use std::str::FromStr;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every request with an id, taken from `x-request-id` when the client
/// sent a valid UUID, and echoes it on the response.
pub async fn add_request_metadata(
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|value| Uuid::from_str(value).ok())
        .unwrap_or_else(Uuid::now_v7);
    tracing::debug!(%request_id, method = %request.method(), uri = %request.uri(), "request");

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

pub fn make_cors_middleware(origin: Option<&str>) -> Result<CorsLayer, InvalidHeaderValue> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::permissive());
    };
    let origin_value = origin.parse::<HeaderValue>()?;
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    Ok(CorsLayer::new()
        .allow_origin(origin_value)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(vec![CONTENT_TYPE, request_id.clone()])
        .expose_headers(vec![request_id]))
}
