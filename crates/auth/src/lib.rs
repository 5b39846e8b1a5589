//! `meshguard-auth`: tokens, request identity and authorization checks.
//!
//! This crate is intentionally decoupled from HTTP: the edge gateway and the
//! internal services both build on it.

pub mod authorize;
pub mod claims;
pub mod config;
pub mod identity;
pub mod lookup;
pub mod permissions;
pub mod roles;
pub mod scope;
pub mod token;

pub use authorize::{authorize, AuthorizationRequirement, Decision, Guard, Logical, RequirementKind};
pub use claims::{ClaimSet, LoginClaims, TokenClaims};
pub use config::{ConfigError, TokenSettings};
pub use identity::{IdentityContext, IdentityContextBuilder};
pub use lookup::{LookupError, LookupPolicy, NoPermissionLookup, PermissionLookup, StaticPermissionLookup};
pub use permissions::Permission;
pub use roles::Role;
pub use scope::{ContextScope, ScopeError};
pub use token::TokenCodec;

pub use meshguard_core::{AuthError, AuthResult, UserId};
