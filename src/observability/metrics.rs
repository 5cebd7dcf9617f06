//! Metrics collection.
//!
//! # Metrics
//! - `rule_compiler_puts_total` (counter): puts by kind, outcome
//! - `rule_compiler_conflicts_total` (counter): rejected puts by kind
//! - `rule_compiler_compiles_total` (counter): compilations by kind, result
//! - `rule_compiler_rules` (gauge): rules per kind and set (basic/advanced)
//! - `rule_compiler_sources` (gauge): sources currently indexed
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for kind, outcome, set

use crate::rules::RuleKind;

pub fn record_put(kind: RuleKind, outcome: &'static str) {
    ::metrics::counter!("rule_compiler_puts_total", "kind" => kind.as_str(), "outcome" => outcome)
        .increment(1);
}

pub fn record_conflict(kind: RuleKind) {
    ::metrics::counter!("rule_compiler_conflicts_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_compile(kind: RuleKind, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    ::metrics::counter!("rule_compiler_compiles_total", "kind" => kind.as_str(), "result" => result)
        .increment(1);
}

pub fn record_rule_counts(kind: RuleKind, basic: usize, advanced: usize) {
    ::metrics::gauge!("rule_compiler_rules", "kind" => kind.as_str(), "set" => "basic").set(basic as f64);
    ::metrics::gauge!("rule_compiler_rules", "kind" => kind.as_str(), "set" => "advanced")
        .set(advanced as f64);
}

pub fn record_sources(count: usize) {
    ::metrics::gauge!("rule_compiler_sources").set(count as f64);
}
