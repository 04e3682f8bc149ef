//! Request admission middleware.
//!
//! Every admitted response carries the `X-RateLimit-*` headers of the bucket
//! the request was counted in. Rejections are rendered by [`crate::error::ApiError`].

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use vnscreen_core::admission::Admission;

use crate::{error::ApiError, main_lib::AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

pub fn rate_limit_headers(limit: u32, remaining: u32, reset_seconds: u64) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(reset_seconds));
    headers
}

/// The `X-API-Key` of a request, if present and non-blank.
pub fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Soft admission: anonymous and invalid callers share the public budget.
pub async fn admit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let admission = state.admission.admit(api_key(request.headers()))?;
    Ok(run_admitted(admission, request, next).await)
}

/// Hard admission: a valid credential is required.
pub async fn admit_required(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let admission = state.admission.admit_required(api_key(request.headers()))?;
    Ok(run_admitted(admission, request, next).await)
}

async fn run_admitted(admission: Admission, mut request: Request<Body>, next: Next) -> Response {
    let headers = rate_limit_headers(
        admission.limit,
        admission.remaining,
        admission.reset_seconds,
    );
    request.extensions_mut().insert(admission);

    let mut response = next.run(request).await;
    response.headers_mut().extend(headers);
    response
}
