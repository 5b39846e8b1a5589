//! Declarative guards for routes.
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/admin/stats", get(stats))
//!     .require(Guard::new().require_role(
//!         AuthorizationRequirement::roles(["ADMIN"]).describe("administrators only"),
//!     ))
//! ```
//!
//! Guards read the identity from the request scope, so they must sit inside
//! the identity propagation layer.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    Router,
};

use meshguard_auth::Guard;

use crate::app::errors::ServiceError;

pub trait RequireGuard {
    /// Enforce `guard` on every route registered so far.
    fn require(self, guard: Guard) -> Self;
}

impl<S> RequireGuard for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn require(self, guard: Guard) -> Self {
        self.route_layer(from_fn_with_state(Arc::new(guard), enforce))
    }
}

pub async fn enforce(State(guard): State<Arc<Guard>>, req: Request, next: Next) -> Response {
    match guard.check_current() {
        Ok(()) => next.run(req).await,
        Err(e) => {
            tracing::debug!(path = req.uri().path(), reason = e.code(), "guard rejected request");
            ServiceError::from(e).into_response()
        }
    }
}
