use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use meshguard_auth::AuthError;

/// Reasons the edge turns a request away before forwarding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRejection {
    Missing,
    Invalid,
    Expired,
    ClaimsInvalid,
}

impl EdgeRejection {
    pub fn code(&self) -> &'static str {
        match self {
            EdgeRejection::Missing => "TOKEN_MISSING",
            EdgeRejection::Invalid => "TOKEN_INVALID",
            EdgeRejection::Expired => "TOKEN_EXPIRED",
            EdgeRejection::ClaimsInvalid => "CLAIMS_INVALID",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            EdgeRejection::Missing => "authentication token is missing",
            EdgeRejection::Invalid => "authentication token is invalid",
            EdgeRejection::Expired => "authentication token has expired",
            EdgeRejection::ClaimsInvalid => "authentication token claims invalid",
        }
    }

    /// Classify a verification failure.
    pub fn from_auth_error(err: &AuthError) -> Self {
        match err {
            AuthError::TokenExpired => EdgeRejection::Expired,
            _ => EdgeRejection::Invalid,
        }
    }
}

impl IntoResponse for EdgeRejection {
    fn into_response(self) -> axum::response::Response {
        json_error(StatusCode::UNAUTHORIZED, self.code(), self.message())
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_error(status, err.code(), err.to_string())
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
