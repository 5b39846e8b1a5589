use axum::{http::StatusCode, response::IntoResponse, Json};

use meshguard_auth::ContextScope;

use crate::context::MaybeIdentity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// What the request scope holds right now. Anonymous requests get
/// `authenticated: false`.
pub async fn session(MaybeIdentity(identity): MaybeIdentity) -> impl IntoResponse {
    Json(serde_json::json!({
        "authenticated": ContextScope::is_authenticated(),
        "user_id": ContextScope::current_user_id().map(|id| id.get()),
        "username": ContextScope::current_username(),
        "super_admin": ContextScope::is_super_admin(),
        "login_ip": identity.as_deref().and_then(|ctx| ctx.login_ip()),
    }))
}
