//! Trusted header propagation contract between the edge and internal services.
//!
//! The edge gateway is the only component allowed to set these headers; it
//! overwrites whatever a client sent. Internal services read them without
//! re-verifying the token.

/// Role code that bypasses every role/permission check.
pub const SUPER_ADMIN_ROLE: &str = "SUPER_ADMIN";

/// Custom header carrying a raw token (second in extraction precedence).
pub const TOKEN_HEADER: &str = "x-token";

/// Query parameter carrying a raw token (last in extraction precedence).
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Prefix of the `Authorization` header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Identity headers set by the edge and trusted downstream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TrustedHeader {
    UserId,
    Username,
    RealName,
    RoleCode,
}

impl TrustedHeader {
    pub const ALL: [TrustedHeader; 4] = [
        TrustedHeader::UserId,
        TrustedHeader::Username,
        TrustedHeader::RealName,
        TrustedHeader::RoleCode,
    ];

    /// Lower-case wire name (HTTP header names are case-insensitive).
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustedHeader::UserId => "x-user-id",
            TrustedHeader::Username => "x-username",
            TrustedHeader::RealName => "x-real-name",
            TrustedHeader::RoleCode => "x-role-code",
        }
    }
}

impl core::fmt::Display for TrustedHeader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
