use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::{error::ApiError, main_lib::AppState};

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Guards operator routes behind the configured admin key.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_key.as_deref() else {
        return Err(ApiError::Unauthorized("Admin API is disabled".to_string()));
    };

    let provided = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .ok_or_else(|| ApiError::Unauthorized("Missing admin key".to_string()))?;

    if provided != expected {
        tracing::warn!("Rejected admin request to {}", request.uri().path());
        return Err(ApiError::Unauthorized("Invalid admin key".to_string()));
    }

    Ok(next.run(request).await)
}
