//! Logging setup shared by the gateway and the services.

/// Initialize process-wide tracing for `component` (e.g. `"gateway"`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(component: &'static str) {
    tracing::init(tracing::LogSettings::for_component(component));
}

/// Tracing configuration (filters, format).
pub mod tracing;
