//! Token settings and environment helpers shared by the gateway and services.

use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

use meshguard_core::AuthError;

/// Default access-token lifetime (2 hours).
pub const DEFAULT_ACCESS_TTL_SECONDS: i64 = 7_200;
/// Default refresh-token lifetime (7 days).
pub const DEFAULT_REFRESH_TTL_SECONDS: i64 = 604_800;
/// Default issuer.
pub const DEFAULT_ISSUER: &str = "meshguard";

// HS512 keys shorter than the hash output are accepted but weaker.
const RECOMMENDED_SECRET_LEN: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

impl From<ConfigError> for AuthError {
    fn from(e: ConfigError) -> Self {
        AuthError::config(e.to_string())
    }
}

/// Signing and lifetime settings for [`TokenCodec`](crate::TokenCodec).
#[derive(Clone)]
pub struct TokenSettings {
    /// Symmetric signing secret (HMAC-SHA512). Must not be empty.
    pub secret: String,
    pub issuer: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
    /// Clock skew tolerated when checking expiry.
    pub leeway_seconds: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            leeway_seconds: 0,
        }
    }
}

impl TokenSettings {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl_seconds = ttl.num_seconds();
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl_seconds = ttl.num_seconds();
        self
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::seconds(self.access_ttl_seconds)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_ttl_seconds)
    }

    /// Reject settings that cannot produce a usable codec.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::config("signing secret is empty"));
        }
        if self.secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = self.secret.len(),
                recommended = RECOMMENDED_SECRET_LEN,
                "signing secret is shorter than recommended for HS512"
            );
        }
        if self.issuer.trim().is_empty() {
            return Err(AuthError::config("issuer is empty"));
        }
        Ok(())
    }

    /// Load settings from `MESHGUARD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        let secret = required_var("MESHGUARD_JWT_SECRET")?;
        let issuer = var_or("MESHGUARD_JWT_ISSUER", DEFAULT_ISSUER.to_string())?;
        let access_ttl_seconds = var_or("MESHGUARD_ACCESS_TTL_SECONDS", DEFAULT_ACCESS_TTL_SECONDS)?;
        let refresh_ttl_seconds =
            var_or("MESHGUARD_REFRESH_TTL_SECONDS", DEFAULT_REFRESH_TTL_SECONDS)?;
        let leeway_seconds = var_or("MESHGUARD_JWT_LEEWAY_SECONDS", 0u64)?;

        if access_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid("MESHGUARD_ACCESS_TTL_SECONDS"));
        }
        if refresh_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid("MESHGUARD_REFRESH_TTL_SECONDS"));
        }

        Ok(Self {
            secret,
            issuer,
            access_ttl_seconds,
            refresh_ttl_seconds,
            leeway_seconds,
        })
    }
}

impl core::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("issuer", &self.issuer)
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish_non_exhaustive()
    }
}

/// Load a `.env` file if one is present. Missing files are fine.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Read a required, non-blank environment variable.
pub fn required_var(key: &'static str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

/// Read and parse an optional environment variable, falling back to `default`.
pub fn var_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        _ => Ok(default),
    }
}

/// Split a comma separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        let err = TokenSettings::default().validate().unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[test]
    fn defaults_match_documented_lifetimes() {
        let s = TokenSettings::new("k");
        assert_eq!(s.access_ttl(), Duration::hours(2));
        assert_eq!(s.refresh_ttl(), Duration::days(7));
        assert_eq!(s.issuer, "meshguard");
    }

    #[test]
    fn debug_output_hides_secret() {
        let s = TokenSettings::new("super-secret-value");
        assert!(!format!("{s:?}").contains("super-secret-value"));
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(
            split_list(" /health, ,/public/** ,"),
            vec!["/health".to_string(), "/public/**".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
