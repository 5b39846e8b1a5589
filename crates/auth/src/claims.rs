use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::UserId;

/// Custom (non-registered) claims carried by a token.
pub type ClaimSet = serde_json::Map<String, Value>;

pub const CLAIM_USER_ID: &str = "userId";
pub const CLAIM_USERNAME: &str = "username";
pub const CLAIM_REAL_NAME: &str = "realName";
pub const CLAIM_ROLE_CODE: &str = "roleCode";
pub const CLAIM_TYPE: &str = "type";

/// Value of the `type` claim on access tokens.
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Registered claims the codec owns. They are never taken from caller input.
pub(crate) const RESERVED_CLAIMS: [&str; 5] = ["sub", "iss", "iat", "exp", "nbf"];

/// Temporal claims dropped before a token is re-issued.
pub(crate) const TEMPORAL_CLAIMS: [&str; 3] = ["iat", "exp", "nbf"];

/// Decoded, verified token payload.
///
/// Registered claims are typed fields; everything else lands in `custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username).
    pub sub: String,

    #[serde(default)]
    pub iss: String,

    /// Issued-at, seconds since the epoch.
    #[serde(default)]
    pub iat: i64,

    /// Expiry, seconds since the epoch.
    pub exp: i64,

    #[serde(flatten)]
    pub custom: ClaimSet,
}

impl TokenClaims {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Raw custom claim.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.custom.get(name)
    }

    /// `userId` claim. Absent, non-integer or out-of-range values yield `None`.
    pub fn user_id(&self) -> Option<UserId> {
        self.claim(CLAIM_USER_ID)
            .and_then(Value::as_i64)
            .map(UserId::new)
    }

    /// `realName` claim, if present and a string.
    pub fn real_name(&self) -> Option<&str> {
        self.string_claim(CLAIM_REAL_NAME)
    }

    /// `roleCode` claim, if present and a string.
    pub fn role_code(&self) -> Option<&str> {
        self.string_claim(CLAIM_ROLE_CODE)
    }

    /// `type` claim, if present and a string.
    pub fn token_type(&self) -> Option<&str> {
        self.string_claim(CLAIM_TYPE)
    }

    pub fn is_access_token(&self) -> bool {
        self.token_type() == Some(ACCESS_TOKEN_TYPE)
    }

    fn string_claim(&self, name: &str) -> Option<&str> {
        self.claim(name).and_then(Value::as_str)
    }
}

/// Standard claim set issued at login.
///
/// Missing `real_name`/`role_code` are encoded as empty strings so the claim
/// shape is stable for consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginClaims {
    pub user_id: UserId,
    pub username: String,
    pub real_name: Option<String>,
    pub role_code: Option<String>,
}

impl LoginClaims {
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            real_name: None,
            role_code: None,
        }
    }

    pub fn with_real_name(mut self, real_name: impl Into<String>) -> Self {
        self.real_name = Some(real_name.into());
        self
    }

    pub fn with_role_code(mut self, role_code: impl Into<String>) -> Self {
        self.role_code = Some(role_code.into());
        self
    }

    pub fn into_claims(self) -> ClaimSet {
        let mut claims = ClaimSet::new();
        claims.insert(CLAIM_USER_ID.into(), Value::from(self.user_id.get()));
        claims.insert(CLAIM_USERNAME.into(), Value::from(self.username));
        claims.insert(
            CLAIM_REAL_NAME.into(),
            Value::from(self.real_name.unwrap_or_default()),
        );
        claims.insert(
            CLAIM_ROLE_CODE.into(),
            Value::from(self.role_code.unwrap_or_default()),
        );
        claims.insert(CLAIM_TYPE.into(), Value::from(ACCESS_TOKEN_TYPE));
        claims
    }
}

impl From<LoginClaims> for ClaimSet {
    fn from(value: LoginClaims) -> Self {
        value.into_claims()
    }
}
