use std::borrow::{Borrow, Cow};

use serde::{Deserialize, Serialize};

/// Role code used for RBAC (e.g. `"ADMIN"`, `"USER"`).
///
/// Roles are opaque strings at this layer; mapping roles to permissions is
/// done by a [`PermissionLookup`](crate::PermissionLookup).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved superadmin role.
    pub fn is_super_admin(&self) -> bool {
        self.as_str() == meshguard_core::SUPER_ADMIN_ROLE
    }
}

// Lets `HashSet<Role>` be queried with a plain `&str`.
impl Borrow<str> for Role {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
