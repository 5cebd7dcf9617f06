//! Source event application.
//!
//! # Responsibilities
//! - Turn each source object into declarations for every enabled compiler
//! - Keep a source's declarations atomic: all of them apply, or none
//! - Recompile and publish after every successful change
//! - Report one status per source so it can be written back
//!
//! # Design Decisions
//! - Upsert journals its index changes and rolls back only those on failure,
//!   so a rejected source costs time proportional to its own rules
//! - A failed source never aborts the rest of a batch
//! - The referenced-service set is instance state, not a global

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::annotations::balance::{self, BalanceWeights, WEIGHT_ANNOTATION};
use crate::annotations::redirect;
use crate::annotations::status::StatusValue;
use crate::compiler::table::{RedirectTable, RouteTable};
use crate::compiler::RuleCompiler;
use crate::error::{CompileError, ValidationError};
use crate::ingest::registry::ServiceRegistry;
use crate::ingest::resource::{source_key, PathRule, SourceObject};
use crate::observability::metrics;
use crate::publish::{Published, TablePublisher};
use crate::rules::RuleKind;

/// cluster → sub-service → weight
type ClusterWeights = BTreeMap<String, BTreeMap<String, u32>>;

/// One change delivered by the watching collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Upsert(SourceObject),
    Delete { namespace: String, name: String },
}

impl SourceEvent {
    pub fn source(&self) -> String {
        match self {
            SourceEvent::Upsert(object) => object.key(),
            SourceEvent::Delete { namespace, name } => source_key(namespace, name),
        }
    }
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub source: String,
    pub result: Result<(), CompileError>,
}

impl SourceStatus {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Value for the status write-back annotation.
    pub fn status_value(&self) -> StatusValue {
        StatusValue::from_result(&self.result)
    }
}

/// Owns the compilers and publishes their tables.
#[derive(Debug)]
pub struct Controller {
    route: RuleCompiler,
    redirect: Option<RuleCompiler>,
    /// source → cluster weights
    weights: BTreeMap<String, ClusterWeights>,
    services: ServiceRegistry,
    route_tables: TablePublisher<RouteTable>,
    redirect_tables: TablePublisher<RedirectTable>,
}

impl Controller {
    pub fn new(redirect_enabled: bool) -> Self {
        Self {
            route: RuleCompiler::new(RuleKind::Route),
            redirect: redirect_enabled.then(|| RuleCompiler::new(RuleKind::Redirect)),
            weights: BTreeMap::new(),
            services: ServiceRegistry::new(),
            route_tables: TablePublisher::default(),
            redirect_tables: TablePublisher::default(),
        }
    }

    pub fn redirect_enabled(&self) -> bool {
        self.redirect.is_some()
    }

    /// Replace every declaration of `object`'s source.
    ///
    /// On error the compilers are left exactly as they were.
    pub fn upsert(&mut self, object: &SourceObject) -> Result<(), CompileError> {
        let source = object.key();
        let prior_weights = self.weights.get(&source).cloned();
        self.compilers_mut().for_each(RuleCompiler::begin);

        match self.upsert_inner(object, &source) {
            Ok((route_table, redirect_table)) => {
                self.compilers_mut().for_each(RuleCompiler::commit);
                self.services.register(&source, object.services());
                metrics::record_sources(self.services.len());
                self.publish(route_table, redirect_table);
                tracing::debug!(source = %source, "Source applied");
                Ok(())
            }
            Err(e) => {
                self.compilers_mut().for_each(RuleCompiler::rollback);
                match prior_weights {
                    Some(weights) => self.weights.insert(source.clone(), weights),
                    None => self.weights.remove(&source),
                };
                tracing::warn!(
                    source = %source,
                    kind = e.kind(),
                    error = %e,
                    "Source rejected, previous rules kept"
                );
                Err(e)
            }
        }
    }

    /// Remove every declaration of a source. Unknown sources are a no-op.
    pub fn delete(&mut self, namespace: &str, name: &str) -> Result<(), CompileError> {
        let source = source_key(namespace, name);

        self.route.delete_by_source(&source);
        if let Some(compiler) = self.redirect.as_mut() {
            compiler.delete_by_source(&source);
        }
        self.weights.remove(&source);
        if self.services.unregister(&source) {
            metrics::record_sources(self.services.len());
            tracing::debug!(source = %source, "Source removed");
        }

        let (route_table, redirect_table) = self.render()?;
        self.publish(route_table, redirect_table);
        Ok(())
    }

    /// Apply each event independently.
    pub fn apply(&mut self, events: Vec<SourceEvent>) -> Vec<SourceStatus> {
        events
            .into_iter()
            .map(|event| {
                let source = event.source();
                let result = match &event {
                    SourceEvent::Upsert(object) => self.upsert(object),
                    SourceEvent::Delete { namespace, name } => self.delete(namespace, name),
                };
                SourceStatus { source, result }
            })
            .collect()
    }

    /// Converge on a full snapshot of source objects.
    ///
    /// Objects apply oldest first, ties broken by source key. Known sources
    /// missing from the snapshot are deleted.
    pub fn reconcile(&mut self, mut objects: Vec<SourceObject>) -> Vec<SourceStatus> {
        objects.sort_by(|a, b| {
            a.creation_timestamp
                .cmp(&b.creation_timestamp)
                .then_with(|| a.key().cmp(&b.key()))
        });

        let present: BTreeSet<String> = objects.iter().map(SourceObject::key).collect();
        let stale: Vec<SourceEvent> = self
            .known_sources()
            .into_iter()
            .filter(|source| !present.contains(source))
            .filter_map(|source| {
                let (namespace, name) = source.split_once('/')?;
                Some(SourceEvent::Delete {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            })
            .collect();

        let events = objects
            .into_iter()
            .map(SourceEvent::Upsert)
            .chain(stale)
            .collect();
        let statuses = self.apply(events);

        let failed = statuses.iter().filter(|s| !s.is_ok()).count();
        tracing::info!(sources = statuses.len(), failed, "Reconciled sources");
        statuses
    }

    pub fn route_table(&self) -> Arc<Published<RouteTable>> {
        self.route_tables.load()
    }

    /// `None` when the redirect compiler is disabled.
    pub fn redirect_table(&self) -> Option<Arc<Published<RedirectTable>>> {
        self.redirect.as_ref().map(|_| self.redirect_tables.load())
    }

    pub fn route_compiler(&self) -> &RuleCompiler {
        &self.route
    }

    pub fn redirect_compiler(&self) -> Option<&RuleCompiler> {
        self.redirect.as_ref()
    }

    pub fn contains_source(&self, namespace: &str, name: &str) -> bool {
        self.services.contains_source(&source_key(namespace, name))
    }

    /// True while any known source routes to `<namespace>/<service>`.
    pub fn is_service_referenced(&self, namespace: &str, service: &str) -> bool {
        self.services.is_referenced(&source_key(namespace, service))
    }

    fn known_sources(&self) -> BTreeSet<String> {
        let mut known: BTreeSet<String> = self.services.sources().map(str::to_string).collect();
        known.extend(self.route.index().sources().map(str::to_string));
        if let Some(compiler) = &self.redirect {
            known.extend(compiler.index().sources().map(str::to_string));
        }
        known
    }

    fn upsert_inner(
        &mut self,
        object: &SourceObject,
        source: &str,
    ) -> Result<(RouteTable, Option<RedirectTable>), CompileError> {
        let annotations = object.rule_annotations();

        // Action annotations are checked before anything is mutated.
        let redirected = match &self.redirect {
            Some(_) => redirect::has_redirect(&annotations)?,
            None => false,
        };
        let rules = object.path_rules()?;
        let weights = balance::weights(&annotations)?
            .map(|weights| cluster_weights(weights, &rules))
            .transpose()?;

        self.route.delete_by_source(source);
        if let Some(compiler) = self.redirect.as_mut() {
            compiler.delete_by_source(source);
        }

        for rule in &rules {
            self.route.put(
                source,
                &rule.host,
                &rule.path,
                &annotations,
                &rule.target,
                object.creation_timestamp,
            )?;
            if redirected {
                if let Some(compiler) = self.redirect.as_mut() {
                    compiler.put(
                        source,
                        &rule.host,
                        &rule.path,
                        &annotations,
                        "",
                        object.creation_timestamp,
                    )?;
                }
            }
        }

        match weights {
            Some(weights) => self.weights.insert(source.to_string(), weights),
            None => self.weights.remove(source),
        };

        self.render()
    }

    fn render(&self) -> Result<(RouteTable, Option<RedirectTable>), CompileError> {
        let route = RouteTable::from_compiled(&self.route.compile()?, self.balance());
        let redirect = match &self.redirect {
            Some(compiler) => Some(RedirectTable::from_compiled(&compiler.compile()?)),
            None => None,
        };
        Ok((route, redirect))
    }

    /// Merged weights of every source, later sources overriding earlier
    /// ones on the same cluster.
    fn balance(&self) -> ClusterWeights {
        let mut merged = ClusterWeights::new();
        for weights in self.weights.values() {
            merged.extend(weights.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    fn publish(&self, route: RouteTable, redirect: Option<RedirectTable>) {
        if let Some(version) = self.route_tables.publish(route) {
            tracing::info!(version, "Published route table");
        }
        if let Some(version) = redirect.and_then(|table| self.redirect_tables.publish(table)) {
            tracing::info!(version, "Published redirect table");
        }
    }

    fn compilers_mut(&mut self) -> impl Iterator<Item = &mut RuleCompiler> {
        std::iter::once(&mut self.route).chain(self.redirect.as_mut())
    }
}

/// Re-key service weights by the clusters the object's path rules target.
fn cluster_weights(
    weights: BalanceWeights,
    rules: &[PathRule],
) -> Result<ClusterWeights, ValidationError> {
    let mut clusters = ClusterWeights::new();
    for (service, split) in weights {
        let targets: Vec<&str> = rules
            .iter()
            .filter(|rule| rule.service == service)
            .map(|rule| rule.target.as_str())
            .collect();
        if targets.is_empty() {
            return Err(ValidationError::annotation(
                WEIGHT_ANNOTATION,
                format!("service {service} is not a backend of this source"),
            ));
        }
        for target in targets {
            clusters.insert(target.to_string(), split.clone());
        }
    }
    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::redirect::SCHEME_SET_ANNOTATION;
    use crate::annotations::route::HEADER_ANNOTATION;
    use crate::ingest::resource::{HostRule, HttpPath, PathType, ServiceBackend};

    fn object(name: &str, host: &str, path: &str, created: u64) -> SourceObject {
        SourceObject {
            namespace: "ns".into(),
            name: name.into(),
            annotations: Default::default(),
            creation_timestamp: created,
            rules: vec![HostRule {
                host: host.into(),
                paths: vec![HttpPath {
                    path: path.into(),
                    path_type: Some(PathType::Exact),
                    backend: ServiceBackend {
                        service: format!("{name}-svc"),
                        port: None,
                    },
                }],
            }],
        }
    }

    #[test]
    fn test_upsert_publishes_route_table() {
        let mut controller = Controller::new(true);
        controller.upsert(&object("a", "example.com", "/foo", 1)).unwrap();

        let table = controller.route_table();
        assert_eq!(table.version, 1);
        assert_eq!(table.table.basic[0].cluster, "ns_a-svc");
        assert!(controller.is_service_referenced("ns", "a-svc"));
        assert!(controller.redirect_table().unwrap().table.is_empty());
    }

    #[test]
    fn test_failed_upsert_keeps_previous_rules() {
        let mut controller = Controller::new(true);
        controller.upsert(&object("a", "example.com", "/foo", 1)).unwrap();

        let mut broken = object("a", "example.com", "/bar", 1);
        broken.rules[0].paths.push(HttpPath {
            path: String::new(),
            path_type: None,
            backend: ServiceBackend {
                service: "x".into(),
                port: None,
            },
        });
        assert!(controller.upsert(&broken).is_err());

        let table = controller.route_table();
        assert_eq!(table.version, 1);
        assert_eq!(table.table.basic[0].path, "/foo");
        assert_eq!(controller.route_compiler().index().len(), 1);
    }

    #[test]
    fn test_rejected_upsert_undoes_displacement_and_partial_puts() {
        let mut controller = Controller::new(true);
        controller.upsert(&object("a", "example.com", "/baz", 1)).unwrap();
        let mut header = object("e", "example.com", "/baz", 2);
        header.annotations.insert(HEADER_ANNOTATION, "X-A: 1");
        controller.upsert(&header).unwrap();
        controller.upsert(&object("b", "example.com", "/foo", 5)).unwrap();
        controller.upsert(&object("c", "example.com", "/bar", 0)).unwrap();
        let before = controller.route_compiler().index().all();
        let version = controller.route_table().version;

        // "/foo" displaces the newer "b"; "/bar" then conflicts with the older "c".
        let mut moved = object("a", "example.com", "/foo", 1);
        moved.rules[0].paths.push(HttpPath {
            path: "/bar".into(),
            path_type: Some(PathType::Exact),
            backend: ServiceBackend {
                service: "a-svc".into(),
                port: None,
            },
        });
        assert!(matches!(controller.upsert(&moved), Err(CompileError::Conflict(_))));

        assert_eq!(controller.route_compiler().index().all(), before);
        assert!(controller.route_compiler().contains_source("ns/b"));
        assert_eq!(controller.route_table().version, version);
        let table = controller.route_table();
        let clusters: Vec<&str> = table.table.advanced.iter().map(|r| r.cluster.as_str()).collect();
        assert_eq!(clusters, vec!["ns_e-svc", "ns_a-svc"]);
    }

    #[test]
    fn test_redirect_rules_only_for_annotated_sources() {
        let mut controller = Controller::new(true);
        let mut redirected = object("r", "example.com", "/old", 1);
        redirected
            .annotations
            .insert(SCHEME_SET_ANNOTATION, "https");
        controller.upsert(&redirected).unwrap();
        controller.upsert(&object("p", "example.com", "/new", 1)).unwrap();

        let redirects = controller.redirect_table().unwrap();
        assert_eq!(redirects.table.len(), 1);
        assert_eq!(controller.route_table().table.basic.len(), 2);
    }

    #[test]
    fn test_redirect_disabled() {
        let mut controller = Controller::new(false);
        let mut redirected = object("r", "example.com", "/old", 1);
        redirected
            .annotations
            .insert(SCHEME_SET_ANNOTATION, "https");
        controller.upsert(&redirected).unwrap();
        assert!(controller.redirect_table().is_none());
        assert!(controller.redirect_compiler().is_none());
    }

    #[test]
    fn test_weights_keyed_by_cluster() {
        let mut controller = Controller::new(false);
        let mut weighted = object("a", "example.com", "/", 1);
        weighted.annotations.insert(
            WEIGHT_ANNOTATION,
            r#"{"a-svc": {"a-svc-v1": 80, "a-svc-v2": 20}}"#,
        );
        controller.upsert(&weighted).unwrap();

        let table = controller.route_table();
        assert_eq!(table.table.balance["ns_a-svc"]["a-svc-v1"], 80);

        weighted.annotations.insert(WEIGHT_ANNOTATION, r#"{"nope": {"x": 1}}"#);
        assert!(matches!(
            controller.upsert(&weighted),
            Err(CompileError::Validation(ValidationError::Annotation { .. }))
        ));
        assert!(controller.route_table().table.balance.contains_key("ns_a-svc"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut controller = Controller::new(true);
        controller.upsert(&object("a", "example.com", "/foo", 1)).unwrap();
        controller.delete("ns", "a").unwrap();
        controller.delete("ns", "a").unwrap();

        assert!(!controller.contains_source("ns", "a"));
        assert!(!controller.is_service_referenced("ns", "a-svc"));
        assert!(controller.route_table().table.is_empty());
        assert_eq!(controller.route_table().version, 2);
    }
}
