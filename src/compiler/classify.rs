//! Partition of the index into basic and advanced rule sets.
//!
//! A bucket holding a single declaration with no routing-relevant
//! annotation is basic: host + path matching suffices. Any other bucket is
//! represented in the basic set by a placeholder deferring to advanced
//! evaluation, and contributes every declaration to the advanced set.

use crate::annotations::{self, Priority};
use crate::compiler::order;
use crate::rules::{Declaration, RuleIndex};

/// Entry of the basic set.
#[derive(Debug, Clone, Copy)]
pub struct BasicEntry<'a> {
    /// The declaration itself, or the bucket's first declaration for a
    /// placeholder.
    pub decl: &'a Declaration,
    /// True for a placeholder deferring to advanced evaluation.
    pub deferred: bool,
}

#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub basic: Vec<BasicEntry<'a>>,
    /// Ordered by match priority.
    pub advanced: Vec<&'a Declaration>,
}

pub fn classify(index: &RuleIndex) -> Classified<'_> {
    let mut classified = Classified::default();

    for bucket in index.buckets() {
        let Some(&first) = bucket.rules.first() else {
            continue;
        };

        if bucket.rules.len() == 1 && annotations::priority(&first.annotations) == Priority::Basic {
            classified.basic.push(BasicEntry {
                decl: first,
                deferred: false,
            });
            continue;
        }

        classified.basic.push(BasicEntry {
            decl: first,
            deferred: true,
        });
        classified.advanced.extend(bucket.rules);
    }

    order::sort(&mut classified.advanced);
    classified
}
