//! Annotation interpreter.
//!
//! Pure functions over a declaration's annotation set.
//!
//! # Data Flow
//! ```text
//! Annotations
//!     → route.rs    (priority class, cookie/header condition fragment)
//!     → redirect.rs (redirect action + status, mutual exclusion)
//!     → balance.rs  (weighted sub-service split)
//!     → status.rs   (write-back of per-source outcome)
//! ```
//!
//! # Design Decisions
//! - All annotations live under one namespace prefix
//! - Fingerprint equality is set equality of the whole annotation map
//! - No function here touches the rule index

pub mod balance;
pub mod redirect;
pub mod route;
pub mod status;

use crate::rules::Annotations;

pub use route::Priority;

/// Namespace shared by every annotation the compiler reads.
pub const ANNOTATION_PREFIX: &str = "bfe.ingress.kubernetes.io/";

/// Annotation fingerprint equality.
pub fn equal(a: &Annotations, b: &Annotations) -> bool {
    a == b
}

/// Priority class of an annotation set.
pub fn priority(annotations: &Annotations) -> Priority {
    route::priority(annotations)
}

/// Render a string literal for the condition language.
pub(crate) fn quote(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
