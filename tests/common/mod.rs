//! Shared builders for integration tests.

#![allow(dead_code)]

use rule_compiler::ingest::{HostRule, HttpPath, PathType, ServiceBackend, SourceObject};
use rule_compiler::{Annotations, Declaration};

pub fn annotations(pairs: &[(&str, &str)]) -> Annotations {
    pairs.iter().copied().collect()
}

/// Route declaration with the given annotations.
pub fn route(source: &str, host: &str, path: &str, pairs: &[(&str, &str)], create_time: u64) -> Declaration {
    Declaration::route(source, host, path, annotations(pairs), "target", create_time)
}

/// Builder for source objects.
pub struct SourceBuilder {
    object: SourceObject,
}

impl SourceBuilder {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            object: SourceObject {
                namespace: namespace.into(),
                name: name.into(),
                annotations: Annotations::new(),
                creation_timestamp: 0,
                rules: Vec::new(),
            },
        }
    }

    pub fn created(mut self, timestamp: u64) -> Self {
        self.object.creation_timestamp = timestamp;
        self
    }

    pub fn annotation(mut self, key: &str, value: &str) -> Self {
        self.object.annotations.insert(key, value);
        self
    }

    /// Add a path under `host`, reusing an existing host rule.
    pub fn path(mut self, host: &str, path: &str, path_type: PathType, service: &str) -> Self {
        let http_path = HttpPath {
            path: path.into(),
            path_type: Some(path_type),
            backend: ServiceBackend {
                service: service.into(),
                port: None,
            },
        };
        match self.object.rules.iter_mut().find(|rule| rule.host == host) {
            Some(rule) => rule.paths.push(http_path),
            None => self.object.rules.push(HostRule {
                host: host.into(),
                paths: vec![http_path],
            }),
        }
        self
    }

    pub fn build(self) -> SourceObject {
        self.object
    }
}
