//! Source objects and declaration extraction.
//!
//! A source object is an ingress-like resource: a namespaced name, a set of
//! annotations, a creation timestamp and host rules each holding path rules
//! that point at a backend service.

use serde::{Deserialize, Serialize};

use crate::annotations::status;
use crate::compiler::condition::HostPrimitive;
use crate::error::ValidationError;
use crate::rules::declaration::{prefix_path, ANY_HOST, PREFIX_MARKER};
use crate::rules::Annotations;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceObject {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub annotations: Annotations,
    /// Unix seconds.
    #[serde(default)]
    pub creation_timestamp: u64,
    #[serde(default)]
    pub rules: Vec<HostRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRule {
    /// Empty means any host.
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub paths: Vec<HttpPath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpPath {
    pub path: String,
    #[serde(default)]
    pub path_type: Option<PathType>,
    pub backend: ServiceBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathType {
    Exact,
    Prefix,
    ImplementationSpecific,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBackend {
    pub service: String,
    #[serde(default)]
    pub port: Option<u16>,
}

impl ServiceBackend {
    /// Cluster name for this backend inside `namespace`.
    pub fn cluster(&self, namespace: &str) -> String {
        match self.port {
            Some(port) => format!("{}_{}_{}", namespace, self.service, port),
            None => format!("{}_{}", namespace, self.service),
        }
    }
}

/// One host + path + target triple extracted from a source object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    pub host: String,
    /// Carries the trailing prefix marker for prefix paths.
    pub path: String,
    pub service: String,
    pub target: String,
}

impl SourceObject {
    /// Source identifier, `<namespace>/<name>`.
    pub fn key(&self) -> String {
        source_key(&self.namespace, &self.name)
    }

    /// Annotations with the status write-back removed.
    pub fn rule_annotations(&self) -> Annotations {
        status::strip(&self.annotations)
    }

    /// Every path rule, validated. Host rules without paths contribute nothing.
    pub fn path_rules(&self) -> Result<Vec<PathRule>, ValidationError> {
        let mut extracted = Vec::new();
        for rule in &self.rules {
            if rule.paths.is_empty() {
                continue;
            }
            let host = check_host(&rule.host)?;
            for http_path in &rule.paths {
                check_path(&http_path.path)?;
                let path = match http_path.path_type {
                    Some(PathType::Exact) => http_path.path.clone(),
                    _ => prefix_path(&http_path.path),
                };
                extracted.push(PathRule {
                    host: host.clone(),
                    path,
                    service: http_path.backend.service.clone(),
                    target: http_path.backend.cluster(&self.namespace),
                });
            }
        }
        Ok(extracted)
    }

    /// Backend services referenced by this object, as `<namespace>/<service>`.
    pub fn services(&self) -> impl Iterator<Item = String> + '_ {
        self.rules
            .iter()
            .flat_map(|rule| rule.paths.iter())
            .map(move |p| source_key(&self.namespace, &p.backend.service))
    }
}

pub fn source_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

fn check_host(host: &str) -> Result<String, ValidationError> {
    if host.is_empty() {
        return Ok(ANY_HOST.to_string());
    }
    HostPrimitive::parse(host)?;
    Ok(host.to_string())
}

fn check_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    if path.contains(PREFIX_MARKER) {
        return Err(ValidationError::IllegalPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(json: &str) -> SourceObject {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extracts_prefix_and_exact_paths() {
        let obj = object(
            r#"{
                "namespace": "default",
                "name": "web",
                "creation_timestamp": 100,
                "rules": [{
                    "host": "example.com",
                    "paths": [
                        {"path": "/api", "path_type": "Prefix", "backend": {"service": "api", "port": 8080}},
                        {"path": "/login", "path_type": "Exact", "backend": {"service": "auth"}},
                        {"path": "/static", "backend": {"service": "cdn"}}
                    ]
                }]
            }"#,
        );

        let rules = obj.path_rules().unwrap();
        let paths: Vec<&str> = rules.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/api*", "/login", "/static*"]);
        assert_eq!(rules[0].target, "default_api_8080");
        assert_eq!(rules[1].target, "default_auth");
        assert_eq!(obj.key(), "default/web");
    }

    #[test]
    fn test_empty_host_means_any() {
        let obj = object(
            r#"{"namespace": "ns", "name": "n", "rules": [
                {"paths": [{"path": "/", "backend": {"service": "s"}}]}
            ]}"#,
        );
        assert_eq!(obj.path_rules().unwrap()[0].host, "*");
    }

    #[test]
    fn test_rejects_bad_host_and_path() {
        let bad_host = object(
            r#"{"namespace": "ns", "name": "n", "rules": [
                {"host": "a.*.com", "paths": [{"path": "/", "backend": {"service": "s"}}]}
            ]}"#,
        );
        assert!(matches!(
            bad_host.path_rules(),
            Err(ValidationError::WildcardHost(_))
        ));

        let bad_path = object(
            r#"{"namespace": "ns", "name": "n", "rules": [
                {"host": "a.com", "paths": [{"path": "/foo*", "backend": {"service": "s"}}]}
            ]}"#,
        );
        assert!(matches!(
            bad_path.path_rules(),
            Err(ValidationError::IllegalPath(_))
        ));
    }

    #[test]
    fn test_hosts_without_paths_are_skipped() {
        let obj = object(
            r#"{"namespace": "ns", "name": "n", "rules": [{"host": "a.*.com"}]}"#,
        );
        assert!(obj.path_rules().unwrap().is_empty());
    }

    #[test]
    fn test_status_annotation_stripped() {
        let mut obj = object(r#"{"namespace": "ns", "name": "n"}"#);
        obj.annotations
            .insert(status::STATUS_ANNOTATION, r#"{"status":"success"}"#);
        obj.annotations.insert("keep", "1");
        let annotations = obj.rule_annotations();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations.get("keep"), Some("1"));
    }
}
