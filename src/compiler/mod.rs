//! Rule compilation subsystem.
//!
//! # Data Flow
//! ```text
//! put(source, host, path, annotations, target, create_time)
//!     → annotations (redirect action / weights, validation)
//!     → condition.rs (synthesis as validation)
//!     → rules::RuleIndex (conflict resolution)
//!
//! compile()
//!     → classify.rs (basic vs advanced, placeholders)
//!     → order.rs (advanced priority order)
//!     → condition.rs (one expression per rule)
//!     → CompiledRules → table.rs (route / redirect tables)
//! ```
//!
//! # Design Decisions
//! - One compiler per rule kind, sharing a single index implementation
//! - Declarations are validated before they reach the index
//! - A compile fails as a whole if any declaration fails synthesis
//! - Deterministic: the same index always compiles to the same output

pub mod classify;
pub mod condition;
pub mod order;
pub mod table;

use serde::{Deserialize, Serialize};

use crate::annotations::balance;
use crate::annotations::redirect::{self, RedirectAction};
use crate::error::{CompileError, ValidationError};
use crate::observability::metrics;
use crate::rules::declaration::ANY_HOST;
use crate::rules::{Annotations, Declaration, Extension, PutOutcome, RuleIndex, RuleKind};

/// Basic-set target meaning "defer to advanced evaluation".
pub const ADVANCED_MODE: &str = "ADVANCED_MODE";

/// What a compiled rule does on match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleAction {
    Forward { target: String },
    /// Placeholder in the basic set.
    AdvancedMode,
    Redirect { action: RedirectAction, status: u16 },
}

/// One rule as consumed by the matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRule {
    pub source: String,
    pub host: String,
    pub path: String,
    pub condition: String,
    pub action: RuleAction,
}

impl CompiledRule {
    pub fn is_placeholder(&self) -> bool {
        self.action == RuleAction::AdvancedMode
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRules {
    pub basic: Vec<CompiledRule>,
    /// In match priority order.
    pub advanced: Vec<CompiledRule>,
}

/// Index plus compilation for one rule kind.
#[derive(Debug, Clone)]
pub struct RuleCompiler {
    kind: RuleKind,
    index: RuleIndex,
}

impl RuleCompiler {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            index: RuleIndex::new(),
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn index(&self) -> &RuleIndex {
        &self.index
    }

    /// Register one declaration.
    ///
    /// For redirect compilers the action and status are derived from the
    /// annotations and `target` is ignored.
    pub fn put(
        &mut self,
        source: &str,
        host: &str,
        path: &str,
        annotations: &Annotations,
        target: &str,
        create_time: u64,
    ) -> Result<PutOutcome, CompileError> {
        let extension = match self.kind {
            RuleKind::Route => Extension::Route {
                target: target.to_string(),
            },
            RuleKind::Redirect => {
                let parsed = redirect::parse(annotations)?
                    .ok_or(ValidationError::MissingRedirectAction)?;
                Extension::Redirect {
                    action: parsed.action,
                    status: parsed.status,
                }
            }
        };

        self.put_declaration(Declaration {
            source: source.to_string(),
            host: host.to_string(),
            path: path.to_string(),
            annotations: annotations.clone(),
            create_time,
            extension,
        })
    }

    /// Register a fully built declaration. An empty host is stored as `"*"`.
    pub fn put_declaration(&mut self, mut decl: Declaration) -> Result<PutOutcome, CompileError> {
        if decl.host.is_empty() {
            decl.host = ANY_HOST.to_string();
        }
        if decl.kind() != self.kind {
            return Err(ValidationError::KindMismatch {
                expected: self.kind,
                found: decl.kind(),
            }
            .into());
        }
        condition::build(&decl.host, &decl.path, &decl.annotations)?;
        if self.kind == RuleKind::Route {
            balance::weights(&decl.annotations)?;
        }

        let source = decl.source.clone();
        let host = decl.host.clone();
        let path = decl.path.clone();

        match self.index.put(decl) {
            Ok(outcome) => {
                if let PutOutcome::Replaced { previous } = &outcome {
                    tracing::info!(
                        kind = %self.kind,
                        source = %source,
                        previous = %previous,
                        host = %host,
                        path = %path,
                        "Rule overwritten by older declaration"
                    );
                }
                metrics::record_put(self.kind, outcome.as_str());
                Ok(outcome)
            }
            Err(conflict) => {
                tracing::warn!(
                    kind = %self.kind,
                    source = %conflict.claimant,
                    holder = %conflict.holder,
                    host = %host,
                    path = %path,
                    "Rule conflict"
                );
                metrics::record_conflict(self.kind);
                Err(conflict.into())
            }
        }
    }

    /// Remove every declaration owned by `source`.
    pub fn delete_by_source(&mut self, source: &str) {
        let removed = self.index.delete_by_source(source);
        if removed > 0 {
            tracing::debug!(kind = %self.kind, source, removed, "Removed source rules");
        }
    }

    pub fn contains_source(&self, source: &str) -> bool {
        self.index.contains_source(source)
    }

    /// Start recording index mutations so they can be rolled back.
    pub fn begin(&mut self) {
        self.index.begin();
    }

    pub fn commit(&mut self) {
        self.index.commit();
    }

    /// Undo every index mutation since `begin`.
    pub fn rollback(&mut self) {
        let undone = self.index.rollback();
        if undone > 0 {
            tracing::debug!(kind = %self.kind, undone, "Rolled back rule changes");
        }
    }

    /// Produce the ordered basic and advanced rule sets.
    pub fn compile(&self) -> Result<CompiledRules, CompileError> {
        let result = self.compile_inner();
        match &result {
            Ok(rules) => {
                tracing::debug!(
                    kind = %self.kind,
                    basic = rules.basic.len(),
                    advanced = rules.advanced.len(),
                    "Compiled rule table"
                );
                metrics::record_compile(self.kind, true);
                metrics::record_rule_counts(self.kind, rules.basic.len(), rules.advanced.len());
            }
            Err(e) => {
                tracing::error!(kind = %self.kind, error = %e, "Rule table compilation failed");
                metrics::record_compile(self.kind, false);
            }
        }
        result
    }

    fn compile_inner(&self) -> Result<CompiledRules, CompileError> {
        let classified = classify::classify(&self.index);

        let mut basic = Vec::with_capacity(classified.basic.len());
        for entry in classified.basic {
            let decl = entry.decl;
            if entry.deferred {
                basic.push(CompiledRule {
                    source: decl.source.clone(),
                    host: decl.host.clone(),
                    path: decl.path.clone(),
                    condition: condition::build(&decl.host, &decl.path, &Annotations::new())?,
                    action: RuleAction::AdvancedMode,
                });
            } else {
                basic.push(compile_rule(decl)?);
            }
        }

        let advanced = classified
            .advanced
            .into_iter()
            .map(compile_rule)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledRules { basic, advanced })
    }
}

fn compile_rule(decl: &Declaration) -> Result<CompiledRule, CompileError> {
    let action = match &decl.extension {
        Extension::Route { target } => RuleAction::Forward {
            target: target.clone(),
        },
        Extension::Redirect { action, status } => RuleAction::Redirect {
            action: action.clone(),
            status: *status,
        },
    };

    Ok(CompiledRule {
        source: decl.source.clone(),
        host: decl.host.clone(),
        path: decl.path.clone(),
        condition: condition::build(&decl.host, &decl.path, &decl.annotations)?,
        action,
    })
}
