use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::app::errors::{auth_error_to_response, EdgeRejection};
use crate::state::GatewayState;
use crate::token_source::extract_token;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// `POST /auth/refresh`: exchange a correctly signed (possibly expired) token
/// for a fresh access token.
///
/// The token must still be inside its refresh window (issued no longer than
/// the refresh TTL ago) and must identify a user, so subject-only refresh
/// tokens are rejected with `CLAIMS_INVALID`.
pub async fn refresh(State(state): State<GatewayState>, headers: HeaderMap, uri: Uri) -> Response {
    let Some((token, source)) = extract_token(&headers, &uri) else {
        return EdgeRejection::Missing.into_response();
    };

    let claims = match state.codec.verify_for_refresh(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(source = source.as_str(), reason = e.code(), "token refresh rejected");
            return auth_error_to_response(e);
        }
    };
    if claims.subject().trim().is_empty() || claims.user_id().is_none() {
        tracing::warn!(source = source.as_str(), reason = "CLAIMS_INVALID", "token refresh rejected");
        return EdgeRejection::ClaimsInvalid.into_response();
    }

    match state.codec.reissue(claims) {
        Ok(access_token) => {
            tracing::info!(source = source.as_str(), "token refreshed");
            Json(RefreshResponse {
                access_token,
                token_type: "Bearer",
                expires_in: state.codec.settings().access_ttl_seconds,
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to re-issue token");
            auth_error_to_response(e)
        }
    }
}
