//! Service application wiring (Axum router).
//!
//! - `routes/`: demo endpoints exercising the guards
//! - `errors.rs`: consistent error responses

use axum::{routing::get, Router};

use meshguard_auth::StaticPermissionLookup;

use crate::middleware;
use crate::state::ServiceState;

pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Every route, public ones included, runs inside the identity propagation
/// layer so each request gets its own scope.
pub fn build_app(state: ServiceState) -> Router {
    let api = Router::new()
        .route("/me", get(routes::profile::me))
        .route("/session", get(routes::system::session))
        .merge(routes::admin::router())
        .merge(routes::reports::router());

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::propagate_identity,
        ))
        .with_state(state)
}

/// Role table used by the demo binary and tests.
pub fn demo_permissions() -> StaticPermissionLookup {
    StaticPermissionLookup::new()
        .grant("USER", ["report:read"])
        .grant("EDITOR", ["report:read", "report:export"])
        .grant("ADMIN", ["report:read", "report:export", "report:delete"])
}
