//! `meshguard-core`: shared vocabulary of the trust boundary.
//!
//! This crate holds the pieces both sides of the mesh agree on: the error
//! taxonomy, the user identifier, and the names of the trusted headers the
//! edge writes and internal services read. It has no HTTP or crypto
//! dependencies.

pub mod error;
pub mod id;
pub mod propagation;

pub use error::{AuthError, AuthResult};
pub use id::UserId;
pub use propagation::{SUPER_ADMIN_ROLE, TrustedHeader};
