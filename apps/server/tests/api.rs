use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use vnscreen_market_data::ScreeningSnapshot;
use vnscreen_server::{api::app_router, build_state, config::Config, AppState};

const ADMIN_KEY: &str = "test-admin-key";

async fn setup() -> (TempDir, Arc<AppState>, Router) {
    let tmp = tempdir().unwrap();
    let mut config = Config::from_env().unwrap();
    config.db_path = tmp.path().join("test.db").to_string_lossy().to_string();
    config.admin_key = Some(ADMIN_KEY.to_string());
    config.strict_credentials = false;
    config.scheduler_enabled = false;
    let state = build_state(&config).await.unwrap();
    let app = app_router(state.clone(), &config);
    (tmp, state, app)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_key(uri: &str, key: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-API-Key", key)
        .body(Body::empty())
        .unwrap()
}

fn admin(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Admin-Key", ADMIN_KEY);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn header(response: &Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn issue_key(app: &Router, per_minute: u32) -> String {
    let response = app
        .clone()
        .oneshot(admin(
            "POST",
            "/api/admin/keys",
            Some(json!({"name": "integration", "tier": "free", "perMinute": per_minute})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    body["secret"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn healthz_works() {
    let (_tmp, _state, app) = setup().await;
    let response = app.oneshot(get("/api/v1/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_stock_is_not_found_but_still_counted() {
    let (_tmp, _state, app) = setup().await;
    let response = app.oneshot(get("/api/v1/stocks/ZZZ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(header(&response, "x-ratelimit-limit"), "20");
    assert_eq!(header(&response, "x-ratelimit-remaining"), "19");
}

#[tokio::test]
async fn stock_lookup_is_served_from_cache_on_second_call() {
    let (_tmp, state, app) = setup().await;
    let mut snapshot = ScreeningSnapshot::new("VNM");
    snapshot.current_price = Some(65_000.0);
    state.datastore.upsert(snapshot).await.unwrap();

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/api/v1/stocks/vnm")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["symbol"], "VNM");
        assert_eq!(body["currentPrice"], 65_000.0);
    }

    let stats = state.cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn public_bucket_is_rejected_after_twenty_requests() {
    let (_tmp, _state, app) = setup().await;
    for _ in 0..20 {
        let response = app.clone().oneshot(get("/api/v1/stocks/ZZZ")).await.unwrap();
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let response = app.oneshot(get("/api/v1/stocks/ZZZ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header(&response, "x-ratelimit-remaining"), "0");
    assert_eq!(header(&response, "x-ratelimit-reset"), "60");
    let body = json_body(response).await;
    assert_eq!(body["limit"], 20);
    assert_eq!(body["remaining"], 0);
    assert_eq!(body["resetSeconds"], 60);
}

#[tokio::test]
async fn invalid_key_is_downgraded_on_the_soft_path() {
    let (_tmp, _state, app) = setup().await;
    let response = app
        .oneshot(with_key("/api/v1/stocks/ZZZ", "vnsk_not-a-real-key"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(header(&response, "x-ratelimit-limit"), "20");
}

#[tokio::test]
async fn rate_limit_status_requires_a_key() {
    let (_tmp, _state, app) = setup().await;
    let response = app
        .clone()
        .oneshot(get("/api/v1/rate-limit/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(with_key("/api/v1/rate-limit/status", "vnsk_unknown"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn issued_key_reports_its_budget_and_stops_working_once_revoked() {
    let (_tmp, _state, app) = setup().await;
    let secret = issue_key(&app, 3).await;

    let response = app
        .clone()
        .oneshot(with_key("/api/v1/rate-limit/status", &secret))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "x-ratelimit-limit"), "3");
    let body = json_body(response).await;
    assert_eq!(body["tier"], "free");
    assert_eq!(body["perMinute"]["limit"], 3);
    assert_eq!(body["perMinute"]["remaining"], 2);

    let response = app
        .clone()
        .oneshot(admin("DELETE", &format!("/api/admin/keys/{}", secret), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(with_key("/api/v1/rate-limit/status", &secret))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listed_keys_are_masked() {
    let (_tmp, _state, app) = setup().await;
    let secret = issue_key(&app, 10).await;

    let response = app
        .oneshot(admin("GET", "/api/admin/keys", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let key = body[0]["key"].as_str().unwrap();
    assert!(key.ends_with("..."));
    assert_ne!(key, secret);
    assert!(secret.starts_with(key.trim_end_matches("...")));
}

#[tokio::test]
async fn admin_routes_require_the_admin_key() {
    let (_tmp, _state, app) = setup().await;
    let response = app
        .clone()
        .oneshot(get("/api/admin/cache/stats"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/admin/cache/stats")
        .header("X-Admin-Key", "wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(admin("GET", "/api/admin/cache/stats", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn manual_jobs_validate_their_parameters() {
    let (_tmp, _state, app) = setup().await;
    let response = app
        .clone()
        .oneshot(admin("POST", "/api/admin/jobs/update-stale?max_stocks=500", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(admin("POST", "/api/admin/jobs/full-scan?delay_seconds=0", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(admin(
            "POST",
            "/api/admin/jobs/update-stale?max_stocks=5&delay_seconds=1",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    assert_eq!(body["jobType"], "update_stale");
}

#[tokio::test]
async fn database_stats_report_freshness() {
    let (_tmp, state, app) = setup().await;
    state
        .datastore
        .upsert(ScreeningSnapshot::new("FPT"))
        .await
        .unwrap();

    let response = app
        .oneshot(admin("GET", "/api/admin/database/stats", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["totalActive"], 1);
    assert_eq!(body["maxAgeHours"], 24);
    assert!(body["recentJobs"].is_array());
}

#[tokio::test]
async fn scheduler_status_lists_default_jobs() {
    let (_tmp, _state, app) = setup().await;
    let response = app
        .oneshot(admin("GET", "/api/admin/scheduler/status", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["running"], false);
    assert_eq!(body["jobs"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn manual_jobs_are_unavailable_once_the_scheduler_stopped() {
    let (_tmp, state, app) = setup().await;
    state.scheduler.stop();

    let response = app
        .clone()
        .oneshot(admin("POST", "/api/admin/jobs/update-stale?max_stocks=5", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .oneshot(admin("POST", "/api/admin/jobs/full-scan", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(state.ledger.recent(10).unwrap().is_empty());
}
