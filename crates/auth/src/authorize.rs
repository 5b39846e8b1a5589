use serde::Serialize;

use crate::{AuthError, AuthResult, ContextScope, IdentityContext};

/// Audit target for authorization decisions worth keeping.
pub const AUDIT_TARGET: &str = "meshguard::audit";

/// How the codes of a requirement combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Logical {
    /// Every code must be held.
    #[default]
    All,
    /// At least one code must be held.
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Role,
    Permission,
}

/// A declarative role or permission requirement attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationRequirement {
    pub kind: RequirementKind,
    pub codes: Vec<String>,
    pub logical: Logical,
    pub description: String,
}

impl AuthorizationRequirement {
    pub fn roles<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RequirementKind::Role, codes)
    }

    pub fn permissions<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RequirementKind::Permission, codes)
    }

    fn new<I, S>(kind: RequirementKind, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            codes: codes.into_iter().map(Into::into).collect(),
            logical: Logical::All,
            description: String::new(),
        }
    }

    /// Satisfied by any one of the codes.
    pub fn any(mut self) -> Self {
        self.logical = Logical::Any;
        self
    }

    pub fn with_logical(mut self, logical: Logical) -> Self {
        self.logical = logical;
        self
    }

    /// Human-readable description reported when the requirement is not met.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether `identity` satisfies the codes, ignoring the superadmin flag.
    pub fn is_satisfied_by(&self, identity: &IdentityContext) -> bool {
        match (self.kind, self.logical) {
            (RequirementKind::Role, Logical::All) => identity.has_all_roles(self.codes.as_slice()),
            (RequirementKind::Role, Logical::Any) => identity.has_any_role(self.codes.as_slice()),
            (RequirementKind::Permission, Logical::All) => identity.has_all_permissions(self.codes.as_slice()),
            (RequirementKind::Permission, Logical::Any) => identity.has_any_permission(self.codes.as_slice()),
        }
    }

    fn denial_message(&self) -> String {
        let what = match self.kind {
            RequirementKind::Role => "insufficient role",
            RequirementKind::Permission => "insufficient permission",
        };
        if self.description.trim().is_empty() {
            format!("{what}: {}", self.codes.join(", "))
        } else {
            format!("{what}: {}", self.description)
        }
    }
}

/// Why an authorization check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The identity holds the required codes.
    Granted,
    /// The identity is a superadmin; codes were not consulted.
    SuperAdminBypass,
    /// The requirement lists no codes and was let through.
    Unconfigured,
}

/// Evaluate `requirement` against `identity`.
///
/// Order: missing identity, superadmin bypass, empty requirement, code match.
/// An empty code list passes with a warning: such a guard is treated as
/// misconfigured rather than as a gate.
pub fn authorize(
    requirement: &AuthorizationRequirement,
    identity: Option<&IdentityContext>,
) -> AuthResult<Decision> {
    let Some(identity) = identity else {
        return Err(AuthError::Unauthenticated);
    };

    if identity.is_super_admin() {
        tracing::info!(
            target: AUDIT_TARGET,
            user_id = %identity.user_id(),
            username = identity.username(),
            kind = ?requirement.kind,
            codes = ?requirement.codes,
            "superadmin bypassed authorization"
        );
        return Ok(Decision::SuperAdminBypass);
    }

    if requirement.codes.is_empty() {
        tracing::warn!(
            kind = ?requirement.kind,
            description = %requirement.description,
            "authorization requirement has no codes; allowing"
        );
        return Ok(Decision::Unconfigured);
    }

    if requirement.is_satisfied_by(identity) {
        return Ok(Decision::Granted);
    }

    tracing::warn!(
        target: AUDIT_TARGET,
        user_id = %identity.user_id(),
        username = identity.username(),
        kind = ?requirement.kind,
        logical = ?requirement.logical,
        codes = ?requirement.codes,
        "authorization denied"
    );
    Err(AuthError::forbidden(requirement.denial_message()))
}

/// Role and permission requirements attached to one operation.
///
/// Both must pass. The role requirement is evaluated first, so its message
/// wins when both fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guard {
    pub role: Option<AuthorizationRequirement>,
    pub permission: Option<AuthorizationRequirement>,
}

impl Guard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_role(mut self, requirement: AuthorizationRequirement) -> Self {
        self.role = Some(requirement);
        self
    }

    pub fn require_permission(mut self, requirement: AuthorizationRequirement) -> Self {
        self.permission = Some(requirement);
        self
    }

    /// Evaluate against an explicit identity.
    pub fn check(&self, identity: Option<&IdentityContext>) -> AuthResult<()> {
        if identity.is_none() {
            return Err(AuthError::Unauthenticated);
        }
        for requirement in [&self.role, &self.permission].into_iter().flatten() {
            authorize(requirement, identity)?;
        }
        Ok(())
    }

    /// Evaluate against the identity bound to the current request.
    pub fn check_current(&self) -> AuthResult<()> {
        let identity = ContextScope::current();
        self.check(identity.as_deref())
    }
}
