//! Identity propagation for downstream services.
//!
//! Wraps every request in its own [`ContextScope`]. Identity is rebuilt from
//! the trusted headers written by the edge; the token is never re-verified
//! here. Malformed headers leave the request anonymous, and guards decide
//! whether that is acceptable.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use meshguard_auth::{
    ContextScope, IdentityContext, LookupError, LookupPolicy, Permission, Role, UserId,
};
use meshguard_core::TrustedHeader;

use crate::app::errors::ServiceError;
use crate::client_ip;
use crate::state::ServiceState;

pub async fn propagate_identity(
    State(state): State<ServiceState>,
    req: Request,
    next: Next,
) -> Response {
    ContextScope::run(async move {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        match build_identity(&state, req.headers(), peer).await {
            Ok(Some(identity)) => {
                tracing::debug!(
                    user_id = %identity.user_id(),
                    username = identity.username(),
                    "identity bound"
                );
                if let Err(e) = ContextScope::bind(identity) {
                    tracing::error!(error = %e, "failed to bind identity; continuing anonymously");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "mandatory permission lookup failed");
                return ServiceError::from(e).into_response();
            }
        }

        let response = next.run(req).await;
        ContextScope::clear();
        response
    })
    .await
}

/// Rebuild the caller's identity from trusted headers.
///
/// `Ok(None)` means anonymous. `Err` only when a mandatory permission lookup
/// fails.
pub async fn build_identity(
    state: &ServiceState,
    headers: &HeaderMap,
    peer: Option<IpAddr>,
) -> Result<Option<IdentityContext>, LookupError> {
    let (Some(raw_id), Some(username)) = (
        header_text(headers, TrustedHeader::UserId.as_str()),
        header_text(headers, TrustedHeader::Username.as_str()),
    ) else {
        return Ok(None);
    };

    let user_id: UserId = match raw_id.parse() {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!(raw = %raw_id, "malformed user id header; continuing anonymously");
            return Ok(None);
        }
    };

    let role = header_text(headers, TrustedHeader::RoleCode.as_str()).map(Role::from);
    let permissions = match &role {
        Some(role) => resolve_permissions(state, role).await?,
        None => Vec::new(),
    };
    let super_admin = role.as_ref().is_some_and(Role::is_super_admin);

    let mut builder = IdentityContext::builder(user_id, username)
        .roles(role)
        .permissions(permissions)
        .login_time(Utc::now())
        .super_admin(super_admin);

    if let Some(real_name) = header_text(headers, TrustedHeader::RealName.as_str()) {
        builder = builder.real_name(real_name);
    }
    if let Some(ip) = client_ip::resolve(headers, peer) {
        builder = builder.login_ip(ip);
    }
    if let Some(agent) = header_text(headers, header::USER_AGENT.as_str()) {
        builder = builder.user_agent(agent);
    }
    if let Some(token) = header_text(headers, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix(meshguard_core::propagation::BEARER_PREFIX).map(str::to_string))
    {
        builder = builder.token(token);
    }

    Ok(Some(builder.build()))
}

/// Run the permission lookup on its own task so a panicking lookup is
/// reported as a failed lookup instead of aborting the request.
async fn resolve_permissions(state: &ServiceState, role: &Role) -> Result<Vec<Permission>, LookupError> {
    let lookup = Arc::clone(&state.lookup);
    let policy = state.lookup_policy;
    let task_role = role.clone();

    match tokio::spawn(async move { policy.resolve(lookup.as_ref(), &task_role).await }).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(role = %role, error = %e, "permission lookup aborted");
            match policy {
                LookupPolicy::BestEffort => Ok(Vec::new()),
                LookupPolicy::Mandatory => Err(LookupError::unavailable("permission lookup aborted")),
            }
        }
    }
}

// Non-blank UTF-8 header value, trimmed.
fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
