use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Extension, Json, Router,
};
use vnscreen_core::{
    admission::{Admission, RateLimitStatus},
    cache::CacheKey,
    errors::Error as CoreError,
    screening::ScreeningRecord,
};

use crate::{
    api::admission::api_key,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

/// Latest stored record for a symbol, served from the result cache when warm.
async fn get_stock(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(admission): Extension<Admission>,
) -> ApiResult<Json<ScreeningRecord>> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(ApiError::BadRequest("Symbol is required".to_string()));
    }
    tracing::debug!("Stock lookup for {} by {}", symbol, admission.tier);

    let key = CacheKey::new("stock").param("symbol", &symbol).build();
    let datastore = state.datastore.clone();
    let record = state
        .cache
        .get_or_try_insert_with(&key, state.cache_ttl, || async move {
            datastore
                .get_by_symbol(&symbol)?
                .ok_or_else(|| CoreError::NotFound(format!("Stock {}", symbol)))
        })
        .await?;
    Ok(Json(record))
}

/// Budget of the calling credential.
async fn get_rate_limit_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<RateLimitStatus>> {
    let secret = api_key(&headers).ok_or(CoreError::Unauthenticated)?;
    let status = state.admission.status(secret)?;
    Ok(Json(status))
}

/// Routes behind soft admission.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/stocks/{symbol}", get(get_stock))
}

/// Routes behind hard admission.
pub fn credential_router() -> Router<Arc<AppState>> {
    Router::new().route("/rate-limit/status", get(get_rate_limit_status))
}
