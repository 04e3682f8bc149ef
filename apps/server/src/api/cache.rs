use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use vnscreen_core::cache::CacheStats;

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SweepResult {
    removed: usize,
}

async fn get_cache_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<CacheStats>> {
    Ok(Json(state.cache.stats()))
}

async fn clear_cache(State(state): State<Arc<AppState>>) -> ApiResult<Json<CacheStats>> {
    state.cache.clear();
    tracing::info!("Result cache cleared");
    Ok(Json(state.cache.stats()))
}

async fn sweep_cache(State(state): State<Arc<AppState>>) -> ApiResult<Json<SweepResult>> {
    let removed = state.cache.sweep();
    Ok(Json(SweepResult { removed }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cache/stats", get(get_cache_stats))
        .route("/cache/clear", post(clear_cache))
        .route("/cache/sweep", post(sweep_cache))
}
