//! Error types for rule compilation.
//!
//! Every error is attributable to a single declaration (or a single source
//! object) and never leaves the rule index partially written.

use thiserror::Error;

use crate::rules::RuleKind;

/// Errors surfaced by `put`, `compile` and the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Malformed host, path or annotation value.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Two sources claim the same match criteria.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// More than one mutually exclusive redirect action annotation.
    #[error("setting multiple redirection-related annotations at the same time is not supported: {}", .0.join(", "))]
    MultipleActions(Vec<String>),
}

impl CompileError {
    /// Short machine-friendly label, used for metrics and status reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::Validation(_) => "validation",
            CompileError::Conflict(_) => "conflict",
            CompileError::MultipleActions(_) => "multiple_actions",
        }
    }
}

/// Malformed input attributable to one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("wildcard host [{0}] is illegal, should start with *.")]
    WildcardHost(String),

    #[error("path is not set")]
    EmptyPath,

    #[error("path [{0}] is illegal")]
    IllegalPath(String),

    /// An annotation value could not be interpreted.
    #[error("annotation {key} is invalid: {reason}")]
    Annotation { key: String, reason: String },

    /// A status override without any redirect action.
    #[error("unexpected annotation: {{{key}:{value}}}")]
    UnexpectedAnnotation { key: String, value: String },

    #[error("the annotation {key} should be an integer number with format 3XX, got [{value}]")]
    StatusCode { key: String, value: String },

    /// A redirect declaration was submitted without any action annotation.
    #[error("no redirect action annotation present")]
    MissingRedirectAction,

    /// A declaration was handed to a compiler of another kind.
    #[error("{found} declaration submitted to the {expected} compiler")]
    KindMismatch { expected: RuleKind, found: RuleKind },
}

impl ValidationError {
    pub(crate) fn annotation(key: &str, reason: impl Into<String>) -> Self {
        ValidationError::Annotation {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// A new declaration collides with an existing, older-or-equal one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("source [{claimant}] conflicts with existing {holder}, rule [host: {host}, path: {path}]")]
pub struct ConflictError {
    /// Source of the rejected declaration.
    pub claimant: String,
    /// Source currently holding the slot.
    pub holder: String,
    pub host: String,
    pub path: String,
}
