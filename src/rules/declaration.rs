//! Declaration records held by the rule index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::annotations::redirect::RedirectAction;

/// Host value meaning "any host".
pub const ANY_HOST: &str = "*";

/// Trailing marker the compiler appends to prefix paths.
pub const PREFIX_MARKER: char = '*';

/// Free-form key/value annotations attached to a source object.
///
/// Ordered so that equality is set equality and rendering is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(BTreeMap<String, String>);

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, String>> for Annotations {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Annotations {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The rule variant a compiler produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Route,
    Redirect,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Route => "route",
            RuleKind::Redirect => "redirect",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extension {
    /// Forward matching requests to a cluster.
    Route { target: String },
    /// Answer matching requests with a redirect.
    Redirect { action: RedirectAction, status: u16 },
}

impl Extension {
    pub fn kind(&self) -> RuleKind {
        match self {
            Extension::Route { .. } => RuleKind::Route,
            Extension::Redirect { .. } => RuleKind::Redirect,
        }
    }
}

/// One host + path + annotations claim made by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Name of the owning external object.
    pub source: String,
    /// `"*"`, an exact hostname, or `"*.<suffix>"`.
    pub host: String,
    /// Exact path, or a prefix path ending in a single `*`.
    pub path: String,
    pub annotations: Annotations,
    /// Creation time of the owning object, Unix seconds.
    pub create_time: u64,
    pub extension: Extension,
}

impl Declaration {
    /// Build a routing declaration.
    pub fn route(
        source: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
        annotations: Annotations,
        target: impl Into<String>,
        create_time: u64,
    ) -> Self {
        Self {
            source: source.into(),
            host: host.into(),
            path: path.into(),
            annotations,
            create_time,
            extension: Extension::Route {
                target: target.into(),
            },
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.extension.kind()
    }

    /// Routing target, if this is a routing declaration.
    pub fn target(&self) -> Option<&str> {
        match &self.extension {
            Extension::Route { target } => Some(target),
            Extension::Redirect { .. } => None,
        }
    }

    /// True when the host matches more than one name.
    pub fn has_wildcard_host(&self) -> bool {
        is_wildcard_host(&self.host)
    }

    /// True when the path matches by prefix.
    pub fn has_prefix_path(&self) -> bool {
        is_prefix_path(&self.path)
    }
}

/// `"*"` and `"*.<suffix>"` are wildcard hosts.
///
/// `"*"` is deliberately a wildcard rather than a one-character exact name,
/// so it ranks after every `"*.<suffix>"` host.
pub fn is_wildcard_host(host: &str) -> bool {
    host == ANY_HOST || host.starts_with("*.")
}

pub fn is_prefix_path(path: &str) -> bool {
    path.ends_with(PREFIX_MARKER)
}

/// Mark a validated path as a prefix path.
pub fn prefix_path(path: &str) -> String {
    let mut marked = String::with_capacity(path.len() + 1);
    marked.push_str(path);
    marked.push(PREFIX_MARKER);
    marked
}
