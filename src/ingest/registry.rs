//! Backend services referenced by known sources.

use std::collections::{BTreeMap, BTreeSet};

/// `<namespace>/<service>` references, per source.
///
/// Owned by one controller; its lifetime is the controller's.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    by_source: BTreeMap<String, BTreeSet<String>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the services referenced by `source`.
    pub fn register(&mut self, source: &str, services: impl IntoIterator<Item = String>) {
        self.by_source
            .insert(source.to_string(), services.into_iter().collect());
    }

    pub fn unregister(&mut self, source: &str) -> bool {
        self.by_source.remove(source).is_some()
    }

    pub fn is_referenced(&self, service: &str) -> bool {
        self.by_source.values().any(|services| services.contains(service))
    }

    pub fn contains_source(&self, source: &str) -> bool {
        self.by_source.contains_key(source)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.by_source.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}
