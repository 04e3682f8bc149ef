use std::sync::Arc;

use axum::{http::HeaderValue, middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{config::Config, main_lib::AppState};

pub mod admin;
pub mod admission;
mod cache;
mod jobs;
mod keys;
mod stocks;

pub async fn healthz() -> &'static str {
    "ok"
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let public = stocks::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        admission::admit,
    ));
    let credentialed = stocks::credential_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        admission::admit_required,
    ));
    let api = Router::new()
        .route("/healthz", get(healthz))
        .merge(public)
        .merge(credentialed);

    let admin = Router::new()
        .merge(keys::router())
        .merge(cache::router())
        .merge(jobs::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin::require_admin,
        ));

    Router::new()
        .nest("/api/v1", api)
        .nest("/api/admin", admin)
        .with_state(state)
        .layer(cors)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
