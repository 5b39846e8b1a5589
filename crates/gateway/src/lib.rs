//! Edge gateway: verifies tokens once and forwards trusted identity headers.

pub mod app;
pub mod config;
pub mod middleware;
pub mod paths;
pub mod proxy;
pub mod state;
pub mod token_source;
