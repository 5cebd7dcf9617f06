//! Condition synthesis.
//!
//! # Responsibilities
//! - Turn a declaration's host into a host primitive
//! - Turn its path into a path primitive
//! - Append the annotation fragment from the interpreter
//! - Combine the non-vacuous primitives with AND semantics
//!
//! # Design Decisions
//! - Wildcard hosts match case-insensitively by regular expression
//! - Exact hosts and paths use membership primitives
//! - `"*"` host and `"*"` path are vacuous and omitted
//! - Malformed hosts and paths are rejected here, so a bad declaration can
//!   never reach a published table

use crate::annotations::{self, route};
use crate::error::ValidationError;
use crate::rules::declaration::{ANY_HOST, PREFIX_MARKER};
use crate::rules::Annotations;

/// Connector between primitives.
pub const AND: &str = "&&";

/// One term of a condition expression.
pub trait Primitive: Send + Sync + std::fmt::Debug {
    /// Rendered expression, or `None` when the term matches everything.
    fn render(&self) -> Option<String>;
}

/// Host restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPrimitive {
    Any,
    /// `*.<suffix>`; holds the suffix including its leading dot.
    Wildcard(String),
    Exact(String),
}

impl HostPrimitive {
    pub fn parse(host: &str) -> Result<Self, ValidationError> {
        if host.is_empty() || host == ANY_HOST {
            return Ok(HostPrimitive::Any);
        }

        let markers = host.matches('*').count();
        if markers == 0 {
            return Ok(HostPrimitive::Exact(host.to_string()));
        }
        if markers > 1 || !host.starts_with("*.") || host.len() <= 2 {
            return Err(ValidationError::WildcardHost(host.to_string()));
        }
        Ok(HostPrimitive::Wildcard(host[1..].to_string()))
    }
}

impl Primitive for HostPrimitive {
    fn render(&self) -> Option<String> {
        match self {
            HostPrimitive::Any => None,
            HostPrimitive::Wildcard(suffix) => Some(format!(
                r#"req_host_regmatch("(?i)^[^.]+{}")"#,
                suffix.replace('.', r"\.")
            )),
            HostPrimitive::Exact(host) => Some(format!("req_host_in({})", annotations::quote(host))),
        }
    }
}

/// Path restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPrimitive {
    Any,
    /// Element prefix, marker stripped.
    Prefix(String),
    Exact(String),
}

impl PathPrimitive {
    pub fn parse(path: &str) -> Result<Self, ValidationError> {
        if path.is_empty() {
            return Err(ValidationError::EmptyPath);
        }
        if path == "*" {
            return Ok(PathPrimitive::Any);
        }

        let (body, prefix) = match path.strip_suffix(PREFIX_MARKER) {
            Some(body) => (body, true),
            None => (path, false),
        };
        if body.is_empty() || body.contains(PREFIX_MARKER) {
            return Err(ValidationError::IllegalPath(path.to_string()));
        }

        Ok(if prefix {
            PathPrimitive::Prefix(body.to_string())
        } else {
            PathPrimitive::Exact(body.to_string())
        })
    }
}

impl Primitive for PathPrimitive {
    fn render(&self) -> Option<String> {
        match self {
            PathPrimitive::Any => None,
            PathPrimitive::Prefix(prefix) => Some(format!(
                "req_path_element_prefix_in({}, false)",
                annotations::quote(prefix)
            )),
            PathPrimitive::Exact(path) => {
                Some(format!("req_path_in({}, false)", annotations::quote(path)))
            }
        }
    }
}

/// Ready-made fragment from the annotation interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationPrimitive(String);

impl AnnotationPrimitive {
    pub fn parse(annotations: &Annotations) -> Result<Self, ValidationError> {
        route::expression(annotations).map(AnnotationPrimitive)
    }
}

impl Primitive for AnnotationPrimitive {
    fn render(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

/// Combines primitives with AND semantics.
#[derive(Debug)]
pub struct AndCondition {
    primitives: Vec<Box<dyn Primitive>>,
}

impl AndCondition {
    pub fn new(primitives: Vec<Box<dyn Primitive>>) -> Self {
        Self { primitives }
    }
}

impl Primitive for AndCondition {
    fn render(&self) -> Option<String> {
        let terms: Vec<String> = self.primitives.iter().filter_map(|p| p.render()).collect();
        if terms.is_empty() {
            None
        } else {
            Some(terms.join(AND))
        }
    }
}

/// Synthesize the condition for a host, path and annotation set.
///
/// A declaration that matches everything yields an empty string.
pub fn build(host: &str, path: &str, annotations: &Annotations) -> Result<String, ValidationError> {
    let condition = AndCondition::new(vec![
        Box::new(HostPrimitive::parse(host)?),
        Box::new(PathPrimitive::parse(path)?),
        Box::new(AnnotationPrimitive::parse(annotations)?),
    ]);
    Ok(condition.render().unwrap_or_default())
}
