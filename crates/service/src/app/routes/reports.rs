use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use meshguard_auth::{authorize, AuthorizationRequirement, Guard};

use crate::app::errors::ServiceError;
use crate::authz::RequireGuard;
use crate::context::CurrentIdentity;
use crate::state::ServiceState;

pub fn router() -> Router<ServiceState> {
    let reading = Router::new().route("/reports", get(list)).require(
        Guard::new().require_permission(
            AuthorizationRequirement::permissions(["report:read", "report:delete"])
                .any()
                .describe("read reports"),
        ),
    );

    let exporting = Router::new().route("/reports/export", post(export)).require(
        Guard::new()
            .require_role(
                AuthorizationRequirement::roles(["EDITOR", "ADMIN"])
                    .any()
                    .describe("editors only"),
            )
            .require_permission(
                AuthorizationRequirement::permissions(["report:read", "report:export"])
                    .describe("export reports"),
            ),
    );

    // Checked inside the handler rather than by a layer.
    let removing = Router::new().route("/reports/:id", delete(remove));

    reading.merge(exporting).merge(removing)
}

async fn list(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
    Json(serde_json::json!({
        "owner": identity.username(),
        "reports": ["q1-revenue", "q2-revenue"],
    }))
}

async fn export(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "exported_by": identity.username() })),
    )
}

async fn remove(
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    let requirement = AuthorizationRequirement::permissions(["report:delete"]).describe("delete reports");
    authorize(&requirement, Some(identity.as_ref()))?;

    tracing::info!(user_id = %identity.user_id(), report = %id, "report deleted");
    Ok(StatusCode::NO_CONTENT)
}
