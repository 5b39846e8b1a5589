//! Issuance and verification of signed, expiring identity tokens.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::claims::{ClaimSet, TokenClaims, RESERVED_CLAIMS, TEMPORAL_CLAIMS};
use crate::config::TokenSettings;
use crate::{AuthError, AuthResult};

const ALGORITHM: Algorithm = Algorithm::HS512;

/// HMAC-SHA512 JWT codec.
///
/// Cheap to clone; keys and validation rules are shared.
#[derive(Clone)]
pub struct TokenCodec {
    settings: Arc<TokenSettings>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    // Same rules minus the expiry check; used only by `refresh`.
    refresh_validation: Arc<Validation>,
}

impl TokenCodec {
    /// Build a codec. Fails with [`AuthError::Config`] on an empty secret.
    pub fn new(settings: TokenSettings) -> AuthResult<Self> {
        settings.validate()?;

        let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = settings.leeway_seconds;
        validation.validate_aud = false;
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let mut refresh_validation = validation.clone();
        refresh_validation.validate_exp = false;

        Ok(Self {
            settings: Arc::new(settings),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
            refresh_validation: Arc::new(refresh_validation),
        })
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Issue a token for `subject` carrying `claims`, valid for `ttl`.
    ///
    /// Registered claims (`sub`, `iss`, `iat`, `exp`, `nbf`) in `claims` are
    /// ignored; the codec always sets them itself.
    pub fn issue(&self, subject: &str, claims: impl Into<ClaimSet>, ttl: Duration) -> AuthResult<String> {
        let mut custom = claims.into();
        for key in RESERVED_CLAIMS {
            custom.remove(key);
        }

        let now = Utc::now().timestamp();
        let payload = TokenClaims {
            sub: subject.to_string(),
            iss: self.settings.issuer.clone(),
            iat: now,
            exp: now + ttl.num_seconds(),
            custom,
        };

        encode(&Header::new(ALGORITHM), &payload, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "failed to sign token");
            AuthError::config(format!("failed to sign token: {e}"))
        })
    }

    /// Issue an access token with the configured access TTL.
    pub fn issue_access(&self, subject: &str, claims: impl Into<ClaimSet>) -> AuthResult<String> {
        self.issue(subject, claims, self.settings.access_ttl())
    }

    /// Issue a refresh token: subject only, no business claims.
    pub fn issue_refresh(&self, subject: &str, ttl: Duration) -> AuthResult<String> {
        self.issue(subject, ClaimSet::new(), ttl)
    }

    /// Issue a refresh token with the configured refresh TTL.
    pub fn issue_refresh_default(&self, subject: &str) -> AuthResult<String> {
        self.issue_refresh(subject, self.settings.refresh_ttl())
    }

    /// Verify signature, issuer and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> AuthResult<TokenClaims> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::token_invalid("empty token"));
        }

        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    /// Re-issue an access token for the same subject and custom claims.
    ///
    /// Only the signature (and issuer) must be valid: an expired token can be
    /// refreshed as long as it is inside its refresh window.
    pub fn refresh(&self, token: &str) -> AuthResult<String> {
        let claims = self.verify_for_refresh(token)?;
        self.reissue(claims)
    }

    /// Decode a correctly signed token for refresh, ignoring its expiry.
    ///
    /// Tokens issued more than the refresh TTL ago fail with
    /// [`AuthError::TokenExpired`].
    pub fn verify_for_refresh(&self, token: &str) -> AuthResult<TokenClaims> {
        let claims = decode::<TokenClaims>(token.trim(), &self.decoding_key, &self.refresh_validation)
            .map_err(|e| {
                tracing::warn!(error = %e, "token refresh rejected");
                AuthError::token_invalid(e.to_string())
            })?
            .claims;

        let window_end = claims.iat.saturating_add(self.settings.refresh_ttl_seconds);
        if window_end < Utc::now().timestamp() {
            tracing::warn!(subject = %claims.sub, "token refresh rejected; refresh window elapsed");
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    /// Sign `claims` again with a fresh issued-at and the access TTL.
    pub fn reissue(&self, claims: TokenClaims) -> AuthResult<String> {
        let mut custom = claims.custom;
        for key in TEMPORAL_CLAIMS {
            custom.remove(key);
        }

        self.issue(&claims.sub, custom, self.settings.access_ttl())
    }

    /// Subject of a valid token, `None` on any verification failure.
    pub fn subject_of(&self, token: &str) -> Option<String> {
        self.verify(token).ok().map(|c| c.sub)
    }

    /// Seconds until expiry; 0 if the token is invalid or already expired.
    pub fn remaining_seconds(&self, token: &str) -> i64 {
        match self.verify(token) {
            Ok(claims) => (claims.exp - Utc::now().timestamp()).max(0),
            Err(_) => 0,
        }
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("settings", &self.settings)
            .finish()
    }
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidSignature => AuthError::token_invalid("bad signature"),
        ErrorKind::InvalidIssuer => AuthError::token_invalid("unexpected issuer"),
        ErrorKind::InvalidAlgorithm => AuthError::token_invalid("unexpected algorithm"),
        _ => AuthError::token_invalid(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::LoginClaims;
    use crate::UserId;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-hs512-signing-in-tests-0123";

    fn codec() -> TokenCodec {
        TokenCodec::new(TokenSettings::new(SECRET)).unwrap()
    }

    fn alice_claims() -> ClaimSet {
        LoginClaims::new(UserId::new(1001), "alice")
            .with_real_name("Alice Liddell")
            .with_role_code("USER")
            .into_claims()
    }

    fn tamper_signature(token: &str) -> String {
        let (head, sig) = token.rsplit_once('.').unwrap();
        let mut bytes = sig.as_bytes().to_vec();
        bytes[5] = if bytes[5] == b'A' { b'B' } else { b'A' };
        format!("{head}.{}", String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        let err = TokenCodec::new(TokenSettings::default()).unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[test]
    fn issue_then_verify_yields_subject_and_claims() {
        let codec = codec();
        let token = codec.issue("alice", alice_claims(), Duration::minutes(5)).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.subject(), "alice");
        assert_eq!(claims.iss, "meshguard");
        assert_eq!(claims.exp - claims.iat, 300);
        assert_eq!(claims.user_id(), Some(UserId::new(1001)));
        assert_eq!(claims.real_name(), Some("Alice Liddell"));
        assert_eq!(claims.role_code(), Some("USER"));
        assert!(claims.is_access_token());
    }

    #[test]
    fn caller_cannot_override_registered_claims() {
        let codec = codec();
        let mut claims = alice_claims();
        claims.insert("sub".into(), json!("mallory"));
        claims.insert("exp".into(), json!(i64::MAX));

        let token = codec.issue("alice", claims, Duration::minutes(1)).unwrap();
        let decoded = codec.verify(&token).unwrap();
        assert_eq!(decoded.sub, "alice");
        assert!(decoded.exp < i64::MAX);
        assert!(!decoded.custom.contains_key("sub"));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let codec = codec();
        let token = codec.issue("alice", alice_claims(), Duration::seconds(-60)).unwrap();
        assert_eq!(codec.verify(&token).unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let codec = codec();
        let token = codec.issue("alice", alice_claims(), Duration::minutes(5)).unwrap();
        let err = codec.verify(&tamper_signature(&token)).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)), "got {err:?}");
    }

    #[test]
    fn tampered_and_expired_token_is_invalid_not_expired() {
        let codec = codec();
        let token = codec.issue("alice", alice_claims(), Duration::seconds(-60)).unwrap();
        let err = codec.verify(&tamper_signature(&token)).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[test]
    fn garbage_and_blank_tokens_are_invalid() {
        let codec = codec();
        assert!(matches!(codec.verify("not.a.jwt"), Err(AuthError::TokenInvalid(_))));
        assert!(matches!(codec.verify("   "), Err(AuthError::TokenInvalid(_))));
    }

    #[test]
    fn token_from_other_secret_is_invalid() {
        let other = TokenCodec::new(TokenSettings::new("a-completely-different-secret")).unwrap();
        let token = other.issue("alice", alice_claims(), Duration::minutes(5)).unwrap();
        assert!(matches!(codec().verify(&token), Err(AuthError::TokenInvalid(_))));
    }

    #[test]
    fn token_from_other_issuer_is_invalid() {
        let other = TokenCodec::new(TokenSettings::new(SECRET).with_issuer("elsewhere")).unwrap();
        let token = other.issue("alice", alice_claims(), Duration::minutes(5)).unwrap();
        assert!(matches!(codec().verify(&token), Err(AuthError::TokenInvalid(_))));
    }

    #[test]
    fn refresh_token_carries_subject_only() {
        let codec = codec();
        let token = codec.issue_refresh_default("alice").unwrap();
        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert!(claims.custom.is_empty());
        assert_eq!(claims.exp - claims.iat, 604_800);
        assert_eq!(claims.user_id(), None);
    }

    #[test]
    fn refresh_accepts_expired_token_and_extends_expiry() {
        let codec = codec();
        let expired = codec.issue("alice", alice_claims(), Duration::seconds(-60)).unwrap();
        let original = decode::<TokenClaims>(&expired, &codec.decoding_key, &codec.refresh_validation)
            .unwrap()
            .claims;

        let fresh = codec.refresh(&expired).unwrap();
        let claims = codec.verify(&fresh).unwrap();

        assert!(claims.exp > original.iat);
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.custom, original.custom);
    }

    #[test]
    fn refresh_drops_stale_not_before() {
        let codec = codec();
        let mut claims = alice_claims();
        claims.insert("nbf".into(), json!(0));
        // `issue` strips nbf as well, so sign a payload carrying it directly.
        let now = Utc::now().timestamp();
        let payload = TokenClaims {
            sub: "alice".into(),
            iss: "meshguard".into(),
            iat: now - 120,
            exp: now - 60,
            custom: claims,
        };
        let token = encode(&Header::new(ALGORITHM), &payload, &codec.encoding_key).unwrap();

        let fresh = codec.refresh(&token).unwrap();
        let decoded = codec.verify(&fresh).unwrap();
        assert!(!decoded.custom.contains_key("nbf"));
        assert_eq!(decoded.user_id(), Some(UserId::new(1001)));
    }

    #[test]
    fn refresh_window_is_bounded_by_refresh_ttl() {
        let codec = TokenCodec::new(TokenSettings::new(SECRET).with_refresh_ttl(Duration::hours(1))).unwrap();
        let now = Utc::now().timestamp();
        let sign = |iat: i64| {
            let payload = TokenClaims {
                sub: "alice".into(),
                iss: "meshguard".into(),
                iat,
                exp: iat + 60,
                custom: alice_claims(),
            };
            encode(&Header::new(ALGORITHM), &payload, &codec.encoding_key).unwrap()
        };

        assert!(codec.refresh(&sign(now - 1_800)).is_ok());
        assert_eq!(codec.refresh(&sign(now - 7_200)), Err(AuthError::TokenExpired));
    }

    #[test]
    fn refresh_rejects_corrupted_token() {
        let codec = codec();
        let token = codec.issue("alice", alice_claims(), Duration::minutes(5)).unwrap();
        assert!(matches!(
            codec.refresh(&tamper_signature(&token)),
            Err(AuthError::TokenInvalid(_))
        ));
        assert!(matches!(codec.refresh("garbage"), Err(AuthError::TokenInvalid(_))));
    }

    #[test]
    fn helpers_never_fail() {
        let codec = codec();
        let token = codec.issue_access("alice", alice_claims()).unwrap();
        assert_eq!(codec.subject_of(&token).as_deref(), Some("alice"));
        let remaining = codec.remaining_seconds(&token);
        assert!(remaining > 7_000 && remaining <= 7_200);

        assert_eq!(codec.subject_of("junk"), None);
        assert_eq!(codec.remaining_seconds("junk"), 0);

        let expired = codec.issue("alice", alice_claims(), Duration::seconds(-5)).unwrap();
        assert_eq!(codec.remaining_seconds(&expired), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: any subject and custom claim set survives issue → verify.
        #[test]
        fn verify_returns_what_was_issued(
            subject in "[a-z][a-z0-9_]{0,15}",
            user_id in any::<i64>(),
            real_name in "\\PC{0,20}",
            extra in prop::collection::btree_map("[a-z]{1,8}", any::<i32>(), 0..4),
            ttl in 1i64..100_000,
        ) {
            let codec = codec();
            let mut claims = LoginClaims::new(user_id, subject.clone())
                .with_real_name(real_name.clone())
                .into_claims();
            for (k, v) in &extra {
                if !RESERVED_CLAIMS.contains(&k.as_str()) && !claims.contains_key(k) {
                    claims.insert(k.clone(), Value::from(*v));
                }
            }

            let token = codec.issue(&subject, claims.clone(), Duration::seconds(ttl)).unwrap();
            let decoded = codec.verify(&token).unwrap();

            prop_assert_eq!(decoded.sub, subject);
            prop_assert_eq!(decoded.custom, claims);
            prop_assert_eq!(decoded.exp - decoded.iat, ttl);
        }
    }
}
