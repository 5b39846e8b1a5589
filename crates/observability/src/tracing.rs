//! Tracing/logging initialization.
//!
//! JSON lines on stdout, filtered by `RUST_LOG`. Targets are kept in the output
//! so audit events (`meshguard::audit`) can be routed separately.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub component: &'static str,
    pub default_filter: String,
    pub json: bool,
}

impl LogSettings {
    pub fn for_component(component: &'static str) -> Self {
        Self {
            component,
            default_filter: DEFAULT_FILTER.to_string(),
            json: true,
        }
    }

    /// Human-readable output, for local runs.
    pub fn pretty(mut self) -> Self {
        self.json = false;
        self
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops). Returns whether
/// this call installed the subscriber.
pub fn init(settings: LogSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.default_filter));

    let installed = if settings.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(true)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    };

    if installed {
        ::tracing::info!(component = settings.component, "tracing initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let _ = init(LogSettings::for_component("test"));
        assert!(!init(LogSettings::for_component("test").pretty()));
    }
}
