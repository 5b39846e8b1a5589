use std::net::SocketAddr;

use meshguard_auth::config::{load_dotenv, var_or};
use meshguard_auth::{ConfigError, LookupPolicy};

pub const DEFAULT_PORT: u16 = 8081;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    pub lookup_policy: LookupPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            lookup_policy: LookupPolicy::BestEffort,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let port: u16 = var_or("SERVICE_PORT", DEFAULT_PORT)?;
        let lookup_policy = var_or("SERVICE_PERMISSION_LOOKUP", LookupPolicy::BestEffort)?;

        Ok(Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            lookup_policy,
        })
    }
}
