use std::sync::Arc;

use meshguard_auth::{AuthResult, TokenCodec};

use crate::config::GatewayConfig;
use crate::paths::ExcludedPathSet;
use crate::proxy::Upstream;

/// Shared gateway state. Cheap to clone.
#[derive(Clone, Debug)]
pub struct GatewayState {
    pub codec: TokenCodec,
    pub excluded: Arc<ExcludedPathSet>,
    pub upstream: Arc<Upstream>,
}

impl GatewayState {
    pub fn from_config(config: &GatewayConfig) -> AuthResult<Self> {
        let codec = TokenCodec::new(config.tokens.clone())?;
        let excluded = ExcludedPathSet::new(&config.excluded_paths);
        let upstream = Upstream::new(config.upstream_url.clone(), config.upstream_timeout)?;

        tracing::info!(
            upstream = %config.upstream_url,
            excluded = ?config.excluded_paths,
            "gateway state ready"
        );

        Ok(Self {
            codec,
            excluded: Arc::new(excluded),
            upstream: Arc::new(upstream),
        })
    }
}
