use axum::{response::IntoResponse, routing::get, Json, Router};

use meshguard_auth::{AuthorizationRequirement, Guard};

use crate::authz::RequireGuard;
use crate::context::CurrentIdentity;
use crate::state::ServiceState;

pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .require(Guard::new().require_role(
            AuthorizationRequirement::roles(["ADMIN"]).describe("administrators only"),
        ))
}

async fn stats(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
    Json(serde_json::json!({
        "requested_by": identity.username(),
        "active_sessions": 1,
    }))
}
