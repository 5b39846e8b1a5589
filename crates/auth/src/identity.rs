use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Permission, Role, UserId};

/// The authenticated principal of a single request.
///
/// Built fresh per request from the trusted headers the edge forwards and
/// dropped when the request ends. Role and permission sets are optional: an
/// absent set never satisfies a check, while a present empty set satisfies an
/// empty ALL requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityContext {
    user_id: UserId,
    username: String,
    real_name: Option<String>,
    role_codes: Option<HashSet<Role>>,
    permission_codes: Option<HashSet<Permission>>,
    login_time: DateTime<Utc>,
    login_ip: Option<String>,
    user_agent: Option<String>,
    #[serde(skip)]
    token: Option<String>,
    super_admin: bool,
}

impl IdentityContext {
    pub fn builder(user_id: impl Into<UserId>, username: impl Into<String>) -> IdentityContextBuilder {
        IdentityContextBuilder::new(user_id.into(), username.into())
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn real_name(&self) -> Option<&str> {
        self.real_name.as_deref()
    }

    pub fn role_codes(&self) -> Option<&HashSet<Role>> {
        self.role_codes.as_ref()
    }

    pub fn permission_codes(&self) -> Option<&HashSet<Permission>> {
        self.permission_codes.as_ref()
    }

    pub fn login_time(&self) -> DateTime<Utc> {
        self.login_time
    }

    pub fn login_ip(&self) -> Option<&str> {
        self.login_ip.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_super_admin(&self) -> bool {
        self.super_admin
    }

    pub fn has_role(&self, code: &str) -> bool {
        contains(self.role_codes.as_ref(), code)
    }

    pub fn has_any_role<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        contains_any(self.role_codes.as_ref(), codes)
    }

    pub fn has_all_roles<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        contains_all(self.role_codes.as_ref(), codes)
    }

    pub fn has_permission(&self, code: &str) -> bool {
        contains(self.permission_codes.as_ref(), code)
    }

    pub fn has_any_permission<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        contains_any(self.permission_codes.as_ref(), codes)
    }

    pub fn has_all_permissions<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        contains_all(self.permission_codes.as_ref(), codes)
    }
}

fn contains<T>(held: Option<&HashSet<T>>, code: &str) -> bool
where
    T: std::borrow::Borrow<str> + Eq + std::hash::Hash,
{
    held.is_some_and(|set| set.contains(code))
}

fn contains_any<T, S>(held: Option<&HashSet<T>>, codes: &[S]) -> bool
where
    T: std::borrow::Borrow<str> + Eq + std::hash::Hash,
    S: AsRef<str>,
{
    held.is_some_and(|set| codes.iter().any(|c| set.contains(c.as_ref())))
}

// Absent set: false. Present set: vacuously true for an empty requirement.
fn contains_all<T, S>(held: Option<&HashSet<T>>, codes: &[S]) -> bool
where
    T: std::borrow::Borrow<str> + Eq + std::hash::Hash,
    S: AsRef<str>,
{
    held.is_some_and(|set| codes.iter().all(|c| set.contains(c.as_ref())))
}

/// Builder for [`IdentityContext`].
#[derive(Debug, Clone)]
pub struct IdentityContextBuilder {
    inner: IdentityContext,
}

impl IdentityContextBuilder {
    fn new(user_id: UserId, username: String) -> Self {
        Self {
            inner: IdentityContext {
                user_id,
                username,
                real_name: None,
                role_codes: None,
                permission_codes: None,
                login_time: Utc::now(),
                login_ip: None,
                user_agent: None,
                token: None,
                super_admin: false,
            },
        }
    }

    pub fn real_name(mut self, real_name: impl Into<String>) -> Self {
        self.inner.real_name = Some(real_name.into());
        self
    }

    pub fn roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.inner.role_codes = Some(roles.into_iter().map(Into::into).collect());
        self
    }

    pub fn permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.inner.permission_codes = Some(permissions.into_iter().map(Into::into).collect());
        self
    }

    pub fn login_time(mut self, at: DateTime<Utc>) -> Self {
        self.inner.login_time = at;
        self
    }

    pub fn login_ip(mut self, ip: impl Into<String>) -> Self {
        self.inner.login_ip = Some(ip.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.inner.user_agent = Some(user_agent.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.inner.token = Some(token.into());
        self
    }

    pub fn super_admin(mut self, super_admin: bool) -> Self {
        self.inner.super_admin = super_admin;
        self
    }

    pub fn build(self) -> IdentityContext {
        self.inner
    }
}
