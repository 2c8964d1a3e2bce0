//! Read-only registry of loaded services.

use std::collections::HashMap;
use std::sync::Arc;

use crate::service::Service;

/// The `id → Service` map produced by the loader.
///
/// Owns the only strong references to the full service set; it is read-only
/// after load and lives for the lifetime of the manager.
pub struct Registry {
    services: HashMap<String, Arc<Service>>,
}

impl Registry {
    pub(crate) fn new(services: HashMap<String, Arc<Service>>) -> Self {
        Self { services }
    }

    /// Fetches a service handle by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Service>> {
        self.services.get(id)
    }

    /// Iterates over every service.
    pub fn services(&self) -> impl Iterator<Item = &Arc<Service>> {
        self.services.values()
    }

    /// Number of loaded services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// True when the registry holds no services.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Services nothing depends on (indegree zero); the entry points for
    /// resume cascades, since starting a source drags its whole reachable
    /// sub-graph of dependencies into running.
    pub fn sources(&self) -> Vec<&Arc<Service>> {
        self.services
            .values()
            .filter(|s| s.dependent_count() == 0)
            .collect()
    }

    /// Services with no dependencies; the entry points for stop cascades,
    /// since stopping a sink drags its dependents out of running first.
    pub fn sinks(&self) -> Vec<&Arc<Service>> {
        self.services
            .values()
            .filter(|s| s.dependency_count() == 0)
            .collect()
    }
}
