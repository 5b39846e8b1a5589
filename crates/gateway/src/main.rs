use std::net::SocketAddr;

use anyhow::Context;

use meshguard_gateway::{app::build_app, config::GatewayConfig, state::GatewayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    meshguard_observability::init("gateway");

    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    let state = GatewayState::from_config(&config).context("failed to initialize gateway")?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tracing::info!(addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
