use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use meshguard_service::{
    app::{build_app, demo_permissions},
    config::ServiceConfig,
    state::ServiceState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    meshguard_observability::init("service");

    let config = ServiceConfig::from_env().context("invalid service configuration")?;
    let state = ServiceState::new(Arc::new(demo_permissions()), config.lookup_policy);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        lookup_policy = ?config.lookup_policy,
        "service listening"
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
