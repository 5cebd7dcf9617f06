//! Rendered tables handed to the publishing collaborator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::annotations::redirect::RedirectAction;
use crate::compiler::{CompiledRules, RuleAction, ADVANCED_MODE};

/// Host + path rule resolved without condition evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicRouteRule {
    pub host: String,
    pub path: String,
    /// Target cluster, or [`ADVANCED_MODE`].
    pub cluster: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedRouteRule {
    pub cond: String,
    pub cluster: String,
}

/// Routing table: basic rules, ordered advanced rules and weighted splits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    pub basic: Vec<BasicRouteRule>,
    pub advanced: Vec<AdvancedRouteRule>,
    /// cluster → sub-service → weight
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub balance: BTreeMap<String, BTreeMap<String, u32>>,
}

impl RouteTable {
    pub fn from_compiled(rules: &CompiledRules, balance: BTreeMap<String, BTreeMap<String, u32>>) -> Self {
        let basic = rules
            .basic
            .iter()
            .filter_map(|rule| {
                let cluster = match &rule.action {
                    RuleAction::Forward { target } => target.clone(),
                    RuleAction::AdvancedMode => ADVANCED_MODE.to_string(),
                    RuleAction::Redirect { .. } => return None,
                };
                Some(BasicRouteRule {
                    host: rule.host.clone(),
                    path: rule.path.clone(),
                    cluster,
                })
            })
            .collect();

        let advanced = rules
            .advanced
            .iter()
            .filter_map(|rule| match &rule.action {
                RuleAction::Forward { target } => Some(AdvancedRouteRule {
                    cond: rule.condition.clone(),
                    cluster: target.clone(),
                }),
                _ => None,
            })
            .collect();

        Self {
            basic,
            advanced,
            balance,
        }
    }

    pub fn len(&self) -> usize {
        self.basic.len() + self.advanced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRule {
    pub cond: String,
    pub actions: Vec<RedirectAction>,
    pub status: u16,
}

/// Redirect table: every rule carries its own condition, in match order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectTable {
    pub rules: Vec<RedirectRule>,
}

impl RedirectTable {
    /// Basic rules first (placeholders dropped), then the ordered advanced rules.
    pub fn from_compiled(rules: &CompiledRules) -> Self {
        let rules = rules
            .basic
            .iter()
            .chain(rules.advanced.iter())
            .filter_map(|rule| match &rule.action {
                RuleAction::Redirect { action, status } => Some(RedirectRule {
                    cond: rule.condition.clone(),
                    actions: vec![action.clone()],
                    status: *status,
                }),
                _ => None,
            })
            .collect();
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
