//! Status write-back annotation.
//!
//! The controller reports each source's outcome as an annotation the
//! watching collaborator writes back onto the originating object.

use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::rules::Annotations;

pub const STATUS_ANNOTATION: &str = "bfe.ingress.kubernetes.io/bfe-ingress-status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Value stored under [`STATUS_ANNOTATION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusValue {
    pub status: Status,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl StatusValue {
    pub fn from_result(result: &Result<(), CompileError>) -> Self {
        match result {
            Ok(()) => Self {
                status: Status::Success,
                message: String::new(),
            },
            Err(e) => Self {
                status: Status::Error,
                message: e.to_string(),
            },
        }
    }

    /// JSON rendering for the annotation value.
    pub fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from(r#"{"status":"error"}"#))
    }
}

/// Drop the status annotation so a write-back never alters a fingerprint.
pub fn strip(annotations: &Annotations) -> Annotations {
    let mut stripped = annotations.clone();
    stripped.remove(STATUS_ANNOTATION);
    stripped
}
