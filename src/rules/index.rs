//! Rule index: the mutable store of declarations.
//!
//! # Responsibilities
//! - Own every declaration record (slot arena)
//! - Primary index: host → path → slots, in insertion order
//! - Secondary index: source → slots, for removal proportional to the
//!   size of the source
//!
//! # Design Decisions
//! - Both indexes hold slot ids into the arena, never copies
//! - Every mutation updates both indexes before returning
//! - Buckets are kept in sorted maps so iteration is deterministic
//! - Empty buckets are pruned immediately
//! - An open journal records the inverse of each mutation, so a batch of
//!   puts and deletes can be undone in time proportional to the batch

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::ConflictError;
use crate::rules::conflict::{self, Resolution};
use crate::rules::declaration::Declaration;

/// Position of a declaration in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub usize);

/// Result of a successful `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    /// An annotation-equal, newer declaration owned by `previous` was overwritten.
    Replaced { previous: String },
    /// The same declaration was already present.
    Unchanged,
}

impl PutOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PutOutcome::Inserted => "inserted",
            PutOutcome::Replaced { .. } => "replaced",
            PutOutcome::Unchanged => "unchanged",
        }
    }
}

/// Declarations sharing one (host, path) pair, in insertion order.
#[derive(Debug)]
pub struct Bucket<'a> {
    pub host: &'a str,
    pub path: &'a str,
    pub rules: Vec<&'a Declaration>,
}

/// Inverse of one mutation.
#[derive(Debug, Clone)]
enum Undo {
    /// `slot` was allocated; `fresh` when it grew the arena.
    Inserted { slot: SlotId, fresh: bool },
    /// `decl` was overwritten in place.
    Replaced { slot: SlotId, decl: Declaration },
    /// `decl` was removed from `position` in its bucket.
    Removed {
        slot: SlotId,
        position: usize,
        decl: Declaration,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    slots: Vec<Option<Declaration>>,
    free: Vec<SlotId>,
    buckets: BTreeMap<String, BTreeMap<String, Vec<SlotId>>>,
    sources: HashMap<String, BTreeSet<SlotId>>,
    journal: Option<Vec<Undo>>,
}

impl RuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a declaration, resolving conflicts with its bucket.
    ///
    /// On error the index is left untouched.
    pub fn put(&mut self, decl: Declaration) -> Result<PutOutcome, ConflictError> {
        let resolution = {
            let occupants = self
                .buckets
                .get(&decl.host)
                .and_then(|paths| paths.get(&decl.path))
                .into_iter()
                .flatten()
                .filter_map(|&slot| self.get(slot).map(|d| (slot, d)));
            conflict::resolve(&decl, occupants)?
        };

        match resolution {
            Resolution::Insert => {
                let source = decl.source.clone();
                let host = decl.host.clone();
                let path = decl.path.clone();
                let fresh = self.free.is_empty();
                let slot = self.alloc(decl);
                self.buckets
                    .entry(host)
                    .or_default()
                    .entry(path)
                    .or_default()
                    .push(slot);
                self.sources.entry(source).or_default().insert(slot);
                self.record(|| Undo::Inserted { slot, fresh });
                Ok(PutOutcome::Inserted)
            }
            Resolution::Replace(slot) => {
                let source = decl.source.clone();
                let old = self.slots[slot.0].replace(decl);
                let previous = old.as_ref().map(|d| d.source.clone()).unwrap_or_default();
                self.unregister(&previous, slot);
                self.sources.entry(source).or_default().insert(slot);
                if let (Some(journal), Some(decl)) = (self.journal.as_mut(), old) {
                    journal.push(Undo::Replaced { slot, decl });
                }
                Ok(PutOutcome::Replaced { previous })
            }
            Resolution::Unchanged => Ok(PutOutcome::Unchanged),
        }
    }

    /// Remove every declaration owned by `source`. Unknown sources are ignored.
    ///
    /// Returns the number of declarations removed.
    pub fn delete_by_source(&mut self, source: &str) -> usize {
        let Some(slots) = self.sources.remove(source) else {
            return 0;
        };

        let removed = slots.len();
        for slot in slots {
            let Some(decl) = self.slots[slot.0].take() else {
                continue;
            };
            self.free.push(slot);

            let position = self.detach(&decl.host, &decl.path, slot).unwrap_or(usize::MAX);
            if let Some(journal) = self.journal.as_mut() {
                journal.push(Undo::Removed {
                    slot,
                    position,
                    decl,
                });
            }
        }
        removed
    }

    /// Start recording mutations. Any open journal is discarded.
    pub fn begin(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Keep every mutation since `begin` and stop recording.
    pub fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo every mutation since `begin`, newest first, and stop recording.
    ///
    /// Slots and bucket positions are restored exactly. Returns the number of
    /// mutations undone; without an open journal this is a no-op.
    pub fn rollback(&mut self) -> usize {
        let Some(journal) = self.journal.take() else {
            return 0;
        };

        let undone = journal.len();
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::Inserted { slot, fresh } => {
                    let Some(decl) = self.slots[slot.0].take() else {
                        continue;
                    };
                    self.detach(&decl.host, &decl.path, slot);
                    self.unregister(&decl.source, slot);
                    if fresh && slot.0 + 1 == self.slots.len() {
                        self.slots.pop();
                    } else {
                        self.free.push(slot);
                    }
                }
                Undo::Replaced { slot, decl } => {
                    let source = decl.source.clone();
                    if let Some(current) = self.slots[slot.0].replace(decl) {
                        self.unregister(&current.source, slot);
                    }
                    self.sources.entry(source).or_default().insert(slot);
                }
                Undo::Removed {
                    slot,
                    position,
                    decl,
                } => {
                    if let Some(at) = self.free.iter().rposition(|s| *s == slot) {
                        self.free.remove(at);
                    }
                    self.sources.entry(decl.source.clone()).or_default().insert(slot);
                    let list = self
                        .buckets
                        .entry(decl.host.clone())
                        .or_default()
                        .entry(decl.path.clone())
                        .or_default();
                    list.insert(position.min(list.len()), slot);
                    self.slots[slot.0] = Some(decl);
                }
            }
        }
        undone
    }

    pub fn contains_source(&self, source: &str) -> bool {
        self.sources.contains_key(source)
    }

    /// Iterate buckets by host, then path.
    pub fn buckets(&self) -> impl Iterator<Item = Bucket<'_>> {
        self.buckets.iter().flat_map(move |(host, paths)| {
            paths.iter().map(move |(path, slots)| Bucket {
                host,
                path,
                rules: slots.iter().filter_map(|&slot| self.get(slot)).collect(),
            })
        })
    }

    /// Copies of every declaration, grouped by bucket.
    pub fn all(&self) -> Vec<Declaration> {
        self.buckets()
            .flat_map(|bucket| bucket.rules.into_iter().cloned())
            .collect()
    }

    /// Declarations owned by `source`.
    pub fn by_source(&self, source: &str) -> Vec<&Declaration> {
        self.sources
            .get(source)
            .into_iter()
            .flatten()
            .filter_map(|&slot| self.get(slot))
            .collect()
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Number of live declarations.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, slot: SlotId) -> Option<&Declaration> {
        self.slots.get(slot.0).and_then(Option::as_ref)
    }

    fn alloc(&mut self, decl: Declaration) -> SlotId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot.0] = Some(decl);
                slot
            }
            None => {
                self.slots.push(Some(decl));
                SlotId(self.slots.len() - 1)
            }
        }
    }

    fn record(&mut self, undo: impl FnOnce() -> Undo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo());
        }
    }

    /// Take `slot` out of its bucket, pruning empty buckets. Returns the
    /// position it held.
    fn detach(&mut self, host: &str, path: &str, slot: SlotId) -> Option<usize> {
        let paths = self.buckets.get_mut(host)?;
        let position = paths.get_mut(path).and_then(|list| {
            let position = list.iter().position(|s| *s == slot)?;
            list.remove(position);
            Some(position)
        });
        if paths.get(path).is_some_and(Vec::is_empty) {
            paths.remove(path);
        }
        if paths.is_empty() {
            self.buckets.remove(host);
        }
        position
    }

    fn unregister(&mut self, source: &str, slot: SlotId) {
        if let Some(set) = self.sources.get_mut(source) {
            set.remove(&slot);
            if set.is_empty() {
                self.sources.remove(source);
            }
        }
    }
}
