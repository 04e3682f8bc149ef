use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use vnscreen_core::errors::Error as CoreError;

use crate::api::admission::rate_limit_headers;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitBody {
    code: u16,
    message: String,
    limit: u32,
    remaining: u32,
    reset_seconds: u64,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Core(CoreError::RateLimitExceeded {
            limit,
            remaining,
            reset_seconds,
        }) = &self
        {
            let status = StatusCode::TOO_MANY_REQUESTS;
            let body = Json(RateLimitBody {
                code: status.as_u16(),
                message: self.to_string(),
                limit: *limit,
                remaining: *remaining,
                reset_seconds: *reset_seconds,
            });
            let headers = rate_limit_headers(*limit, *remaining, *reset_seconds);
            return (status, headers, body).into_response();
        }

        let (status, msg) = match &self {
            ApiError::Core(e) => match e {
                CoreError::Unauthenticated => (StatusCode::UNAUTHORIZED, e.to_string()),
                CoreError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                CoreError::JobAlreadyFinished(_) => (StatusCode::CONFLICT, e.to_string()),
                CoreError::Provider(_) => (StatusCode::BAD_GATEWAY, e.to_string()),
                CoreError::SchedulerStopped => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            },
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            ApiError::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, reason.clone()),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", msg);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
