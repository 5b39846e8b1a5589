//! Edge authentication filter.
//!
//! Runs in front of the upstream forwarder. It is the only place a token is
//! verified; everything downstream trusts the identity headers it writes.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use meshguard_auth::TokenClaims;
use meshguard_core::TrustedHeader;

use crate::app::errors::{json_error, EdgeRejection};
use crate::paths::has_dot_segment;
use crate::state::GatewayState;
use crate::token_source::extract_token;

pub async fn edge_auth(
    State(state): State<GatewayState>,
    mut req: Request,
    next: Next,
) -> Response {
    // Client-supplied identity headers never survive the edge.
    strip_trusted_headers(req.headers_mut());

    let path = req.uri().path().to_owned();
    if has_dot_segment(&path) {
        tracing::warn!(path = %path, reason = "PATH_INVALID", "request rejected at edge");
        return json_error(StatusCode::BAD_REQUEST, "PATH_INVALID", "path contains dot segments");
    }
    if state.excluded.matches(&path) {
        tracing::debug!(path = %path, "excluded path; forwarding without verification");
        return next.run(req).await;
    }

    let Some((token, source)) = extract_token(req.headers(), req.uri()) else {
        return reject(&path, EdgeRejection::Missing);
    };

    let claims = match state.codec.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(path = %path, source = source.as_str(), error = %e, "token verification failed");
            return reject(&path, EdgeRejection::from_auth_error(&e));
        }
    };

    match identity_headers(&claims) {
        Some(values) => {
            for (name, value) in values {
                req.headers_mut().insert(name.as_str(), value);
            }
        }
        None => return reject(&path, EdgeRejection::ClaimsInvalid),
    }

    tracing::debug!(
        path = %path,
        username = claims.subject(),
        source = source.as_str(),
        "request authenticated at edge"
    );
    next.run(req).await
}

fn reject(path: &str, rejection: EdgeRejection) -> Response {
    tracing::warn!(path = %path, reason = rejection.code(), "request rejected at edge");
    rejection.into_response()
}

pub fn strip_trusted_headers(headers: &mut HeaderMap) {
    for header in TrustedHeader::ALL {
        headers.remove(header.as_str());
    }
}

/// Trusted header values for verified claims, or `None` if the claims do not
/// identify a user (blank subject, missing or non-integer `userId`).
///
/// Real name and role code are only emitted when non-blank.
pub fn identity_headers(claims: &TokenClaims) -> Option<Vec<(TrustedHeader, HeaderValue)>> {
    let username = claims.subject().trim();
    if username.is_empty() {
        return None;
    }
    let user_id = claims.user_id()?;

    let mut values = vec![
        (TrustedHeader::UserId, HeaderValue::from(user_id.get())),
        (TrustedHeader::Username, HeaderValue::from_bytes(username.as_bytes()).ok()?),
    ];

    let optional = [
        (TrustedHeader::RealName, claims.real_name()),
        (TrustedHeader::RoleCode, claims.role_code()),
    ];
    for (header, value) in optional {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            continue;
        };
        match HeaderValue::from_bytes(value.as_bytes()) {
            Ok(v) => values.push((header, v)),
            Err(_) => tracing::warn!(header = header.as_str(), "claim not representable as a header; dropped"),
        }
    }

    Some(values)
}
