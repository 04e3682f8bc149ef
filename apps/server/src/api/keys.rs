use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use vnscreen_core::credentials::{
    CredentialStats, CredentialView, IssuedCredential, RateLimits, Tier,
};

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateKeyRequest {
    name: String,
    #[serde(default = "default_tier")]
    tier: Tier,
    /// Overrides of the tier defaults
    per_minute: Option<u32>,
    per_day: Option<u32>,
}

fn default_tier() -> Tier {
    Tier::Free
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TierInfo {
    tier: Tier,
    name: &'static str,
    limits: RateLimits,
    features: &'static [&'static str],
}

async fn create_key(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateKeyRequest>,
) -> ApiResult<(StatusCode, Json<IssuedCredential>)> {
    let defaults = body.tier.default_limits();
    let limits = RateLimits::new(
        body.per_minute.unwrap_or(defaults.per_minute),
        body.per_day.unwrap_or(defaults.per_day),
    );
    let issued = state.registry.create(&body.name, body.tier, limits)?;
    tracing::info!("Issued {} API key '{}'", issued.tier, body.name.trim());
    Ok((StatusCode::CREATED, Json(issued)))
}

async fn list_keys(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<CredentialView>>> {
    Ok(Json(state.registry.list()))
}

async fn revoke_key(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.registry.revoke(&key)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tiers() -> Json<Vec<TierInfo>> {
    let tiers = Tier::ALL
        .iter()
        .map(|tier| TierInfo {
            tier: *tier,
            name: tier.display_name(),
            limits: tier.default_limits(),
            features: tier.features(),
        })
        .collect();
    Json(tiers)
}

async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<CredentialStats>> {
    Ok(Json(state.registry.stats()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/keys", get(list_keys).post(create_key))
        .route("/keys/{key}", delete(revoke_key))
        .route("/tiers", get(list_tiers))
        .route("/stats", get(get_stats))
}
