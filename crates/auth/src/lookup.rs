//! Role to permission resolution.
//!
//! Services inject a [`PermissionLookup`]; where the data lives (database,
//! cache, static table) is up to the deployment.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

use crate::{Permission, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("permission lookup unavailable: {0}")]
    Unavailable(String),
}

impl LookupError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

#[async_trait]
pub trait PermissionLookup: Send + Sync {
    async fn permissions_for_role(&self, role: &Role) -> Result<Vec<Permission>, LookupError>;
}

/// In-memory role table.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissionLookup {
    table: HashMap<Role, Vec<Permission>>,
}

impl StaticPermissionLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant<I, P>(mut self, role: impl Into<Role>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.table
            .entry(role.into())
            .or_default()
            .extend(permissions.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl PermissionLookup for StaticPermissionLookup {
    async fn permissions_for_role(&self, role: &Role) -> Result<Vec<Permission>, LookupError> {
        Ok(self.table.get(role).cloned().unwrap_or_default())
    }
}

/// Resolves nothing. Identities carry only their role.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPermissionLookup;

#[async_trait]
impl PermissionLookup for NoPermissionLookup {
    async fn permissions_for_role(&self, _role: &Role) -> Result<Vec<Permission>, LookupError> {
        Ok(Vec::new())
    }
}

/// What a failed lookup means for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPolicy {
    /// A failure resolves to no permissions and the request continues.
    #[default]
    BestEffort,
    /// A failure aborts the request.
    Mandatory,
}

impl LookupPolicy {
    /// Run `lookup` for `role` under this policy.
    pub async fn resolve(
        self,
        lookup: &dyn PermissionLookup,
        role: &Role,
    ) -> Result<Vec<Permission>, LookupError> {
        match lookup.permissions_for_role(role).await {
            Ok(permissions) => Ok(permissions),
            Err(e) if self == LookupPolicy::BestEffort => {
                tracing::warn!(role = %role, error = %e, "permission lookup failed; continuing without permissions");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

impl FromStr for LookupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            "mandatory" => Ok(Self::Mandatory),
            other => Err(format!("unknown lookup policy: {other}")),
        }
    }
}
