use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use meshguard_auth::{AuthError, LookupError};

/// Errors surfaced to HTTP callers of a service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServiceError::Auth(e) => auth_error_to_response(e),
            ServiceError::Lookup(e) => json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                e.to_string(),
            ),
        }
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match &err {
        AuthError::Unauthenticated => "authentication required".to_string(),
        AuthError::Forbidden(reason) => reason.clone(),
        other => other.to_string(),
    };
    json_error(status, err.code(), message)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
