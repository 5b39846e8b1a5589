//! Downstream service side of the trust boundary: rebuilds the caller's
//! identity from the edge's trusted headers and enforces guards.

pub mod app;
pub mod authz;
pub mod client_ip;
pub mod config;
pub mod context;
pub mod middleware;
pub mod state;
