//! Rule compiler for ingress routing and redirect declarations.
//!
//! Declarations (host, path, annotations, target, creation time) go in;
//! deterministic, priority-ordered route and redirect tables come out.

pub mod annotations;
pub mod compiler;
pub mod config;
pub mod error;
pub mod ingest;
pub mod lifecycle;
pub mod observability;
pub mod publish;
pub mod rules;

pub use compiler::{CompiledRule, CompiledRules, RuleAction, RuleCompiler};
pub use config::CompilerConfig;
pub use error::{CompileError, ConflictError, ValidationError};
pub use ingest::{Controller, SourceEvent, SourceObject, SourceStatus};
pub use rules::{Annotations, Declaration, RuleKind};
