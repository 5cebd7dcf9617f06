//! Conflict resolution for declarations sharing a (host, path) bucket.
//!
//! # Policy
//! - No annotation-equal occupant: the candidate is inserted.
//! - Occupant is newer than the candidate: the candidate replaces it in place
//!   (oldest declaration wins).
//! - Occupant has the same creation time: the candidate is the same
//!   declaration republished, nothing changes.
//! - Occupant is older: conflict.

use crate::annotations;
use crate::error::ConflictError;
use crate::rules::declaration::Declaration;
use crate::rules::index::SlotId;

/// What the index must do with a candidate declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Append to the bucket.
    Insert,
    /// Overwrite the occupant of this slot.
    Replace(SlotId),
    /// Already present.
    Unchanged,
}

/// Decide how `candidate` fits among the current occupants of its bucket.
pub fn resolve<'a, I>(candidate: &Declaration, occupants: I) -> Result<Resolution, ConflictError>
where
    I: IntoIterator<Item = (SlotId, &'a Declaration)>,
{
    let found = occupants
        .into_iter()
        .find(|(_, existing)| annotations::equal(&candidate.annotations, &existing.annotations));

    let Some((slot, existing)) = found else {
        return Ok(Resolution::Insert);
    };

    match candidate.create_time.cmp(&existing.create_time) {
        std::cmp::Ordering::Less => Ok(Resolution::Replace(slot)),
        std::cmp::Ordering::Equal => Ok(Resolution::Unchanged),
        std::cmp::Ordering::Greater => Err(ConflictError {
            claimant: candidate.source.clone(),
            holder: existing.source.clone(),
            host: candidate.host.clone(),
            path: candidate.path.clone(),
        }),
    }
}
