//! Handler extractors for the identity bound by
//! [`propagate_identity`](crate::middleware::propagate_identity).

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use meshguard_auth::{AuthError, ContextScope, IdentityContext};

use crate::app::errors::ServiceError;

/// The caller's identity. Rejects with 401 when the request is anonymous.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Arc<IdentityContext>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        ContextScope::current()
            .map(CurrentIdentity)
            .ok_or(ServiceError::Auth(AuthError::Unauthenticated))
    }
}

/// The caller's identity if there is one.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Arc<IdentityContext>>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(ContextScope::current()))
    }
}
