use std::sync::Arc;

use meshguard_auth::{LookupPolicy, NoPermissionLookup, PermissionLookup};

/// Shared service state. Cheap to clone.
#[derive(Clone)]
pub struct ServiceState {
    pub lookup: Arc<dyn PermissionLookup>,
    pub lookup_policy: LookupPolicy,
}

impl ServiceState {
    pub fn new(lookup: Arc<dyn PermissionLookup>, lookup_policy: LookupPolicy) -> Self {
        Self {
            lookup,
            lookup_policy,
        }
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new(Arc::new(NoPermissionLookup), LookupPolicy::BestEffort)
    }
}

impl core::fmt::Debug for ServiceState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServiceState")
            .field("lookup_policy", &self.lookup_policy)
            .finish_non_exhaustive()
    }
}
