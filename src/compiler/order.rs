//! Total priority order of advanced rules.
//!
//! First non-equal dimension decides:
//! 1. host: non-wildcard before wildcard, then longer before shorter
//! 2. path: exact before prefix, then longer before shorter
//! 3. annotation priority class, higher first
//! 4. creation time, earlier first

use std::cmp::Ordering;

use crate::annotations;
use crate::rules::declaration::{is_prefix_path, is_wildcard_host};
use crate::rules::Declaration;

/// `Less` means `a` is matched before `b`.
pub fn compare(a: &Declaration, b: &Declaration) -> Ordering {
    specificity(&a.host, &b.host, is_wildcard_host)
        .then_with(|| specificity(&a.path, &b.path, is_prefix_path))
        .then_with(|| annotations::priority(&b.annotations).cmp(&annotations::priority(&a.annotations)))
        .then_with(|| a.create_time.cmp(&b.create_time))
}

/// Stable sort: equal-rank declarations keep their index order.
pub fn sort(rules: &mut [&Declaration]) {
    rules.sort_by(|a, b| compare(a, b));
}

fn specificity(a: &str, b: &str, wildcard: fn(&str) -> bool) -> Ordering {
    match (wildcard(a), wildcard(b)) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => b.len().cmp(&a.len()),
    }
}
