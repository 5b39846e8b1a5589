//! Gateway configuration (environment driven, validated at start-up).

use std::net::SocketAddr;
use std::time::Duration;

use meshguard_auth::config::{load_dotenv, required_var, split_list, var_or};
use meshguard_auth::{ConfigError, TokenSettings};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
    /// Base URL every non-local request is forwarded to.
    pub upstream_url: url::Url,
    pub upstream_timeout: Duration,
    /// Raw patterns; see [`ExcludedPathSet`](crate::paths::ExcludedPathSet).
    pub excluded_paths: Vec<String>,
    pub tokens: TokenSettings,
}

impl GatewayConfig {
    /// Build a config in code (tests, embedding).
    pub fn new(upstream_url: url::Url, tokens: TokenSettings) -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            upstream_url,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECONDS),
            excluded_paths: Vec::new(),
            tokens,
        }
    }

    pub fn with_excluded_paths<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_paths = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let port: u16 = var_or("GATEWAY_PORT", DEFAULT_PORT)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let upstream_url = url::Url::parse(&required_var("GATEWAY_UPSTREAM_URL")?)
            .map_err(|_| ConfigError::Invalid("GATEWAY_UPSTREAM_URL"))?;
        if !matches!(upstream_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid("GATEWAY_UPSTREAM_URL"));
        }

        let upstream_timeout = Duration::from_secs(var_or(
            "GATEWAY_UPSTREAM_TIMEOUT_SECONDS",
            DEFAULT_UPSTREAM_TIMEOUT_SECONDS,
        )?);

        let excluded_paths =
            split_list(&std::env::var("GATEWAY_EXCLUDED_PATHS").unwrap_or_default());

        let tokens = TokenSettings::from_env()?;

        Ok(Self {
            addr,
            upstream_url,
            upstream_timeout,
            excluded_paths,
            tokens,
        })
    }
}
