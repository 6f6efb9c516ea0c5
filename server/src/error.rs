//! Maps `recruit_service::ServiceError`'s taxonomy (spec.md §7) onto HTTP
//! status codes, the way `terraphim_server::error` maps `ServiceError`'s
//! `category()`/`is_recoverable()` onto a response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use recruit_service::ServiceError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub kind: &'static str,
    pub issues: Option<Vec<recruit_types::ValidationIssue>>,
}

/// Wraps any error reaching a handler; downcasts the chain to find a
/// `ServiceError` and picks the status code from its variant (spec.md §7).
#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let issues = self
            .1
            .downcast_ref::<ServiceError>()
            .and_then(|err| match err {
                ServiceError::Validation(issues) => Some(issues.clone()),
                _ => None,
            });

        (
            self.0,
            Json(ErrorResponse {
                message: self.1.to_string(),
                kind: kind_from_error(&self.1),
                issues,
            }),
        )
            .into_response()
    }
}

fn kind_from_error(error: &anyhow::Error) -> &'static str {
    for cause in error.chain() {
        if let Some(service_err) = cause.downcast_ref::<ServiceError>() {
            return match service_err {
                ServiceError::Validation(_) => "validation",
                ServiceError::NotFound(_) => "not_found",
                ServiceError::Search(_) => "search",
                ServiceError::MalformedParameter(_) => "malformed_parameter",
            };
        }
    }
    "internal"
}

fn status_code_from_error(error: &anyhow::Error) -> StatusCode {
    for cause in error.chain() {
        if let Some(service_err) = cause.downcast_ref::<ServiceError>() {
            return match service_err {
                ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::MalformedParameter(_) => StatusCode::BAD_REQUEST,
                ServiceError::Search(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        let status = status_code_from_error(&error);
        ApiError(status, error)
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
