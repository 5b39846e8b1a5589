//! Gateway application wiring (Axum router).
//!
//! Gateway-local endpoints (`/health`, `/auth/refresh`) are served directly.
//! Everything else goes through the edge filter and is forwarded upstream.

use axum::{
    routing::{get, post},
    Router,
};

use crate::middleware;
use crate::proxy;
use crate::state::GatewayState;

pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: GatewayState) -> Router {
    let proxied = Router::new()
        .fallback(proxy::forward)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::edge_auth,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/refresh", post(routes::auth::refresh))
        .merge(proxied)
        .with_state(state)
}
