//! Authentication/authorization error model.

use thiserror::Error;

/// Result type used across the trust core.
pub type AuthResult<T> = Result<T, AuthError>;

/// Error taxonomy of the trust boundary.
///
/// `TokenInvalid`/`TokenExpired` are produced by token verification and are
/// converted to a 401 at the edge. `Unauthenticated`/`Forbidden` are produced
/// by authorization guards inside services. `Config` is fatal at start-up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Invalid or missing configuration (e.g. an empty signing secret).
    #[error("configuration error: {0}")]
    Config(String),

    /// Token is malformed or its signature does not verify.
    #[error("token invalid: {0}")]
    TokenInvalid(String),

    /// Token is structurally valid but past its expiry.
    #[error("token expired")]
    TokenExpired,

    /// No identity is bound where one is required.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Identity present but a role/permission requirement is not met.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl AuthError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn token_invalid(msg: impl Into<String>) -> Self {
        Self::TokenInvalid(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Stable, machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::TokenInvalid(_) => "TOKEN_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Unauthenticated => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
        }
    }

    /// HTTP status class for this error.
    ///
    /// Kept as a plain number so this crate stays framework-agnostic.
    pub fn status(&self) -> u16 {
        match self {
            Self::Config(_) => 500,
            Self::TokenInvalid(_) | Self::TokenExpired | Self::Unauthenticated => 401,
            Self::Forbidden(_) => 403,
        }
    }

    /// Whether the error means "no usable identity" (as opposed to "not allowed").
    pub fn is_unauthenticated(&self) -> bool {
        self.status() == 401
    }
}
