//! Table publishing subsystem.
//!
//! # Data Flow
//! ```text
//! Controller (after a successful compile)
//!     → TablePublisher::publish(table)
//!     → unchanged? keep current version
//!     → changed?   store Published { version + 1, table }
//!
//! Readers
//!     → TablePublisher::load() → Arc<Published<T>> (lock-free)
//! ```
//!
//! # Design Decisions
//! - Only successfully compiled tables are ever stored, so the current
//!   value is always the last good table
//! - Readers never block the single writer
//! - Writing tables to disk lives here but is only called by the binary

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

/// A table stamped with the version it was published under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Published<T> {
    pub version: u64,
    #[serde(flatten)]
    pub table: T,
}

/// Holder of the last good table of one kind.
#[derive(Debug)]
pub struct TablePublisher<T> {
    current: ArcSwap<Published<T>>,
}

impl<T: PartialEq> TablePublisher<T> {
    /// Starts at version 0 holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            current: ArcSwap::from_pointee(Published {
                version: 0,
                table: initial,
            }),
        }
    }

    pub fn load(&self) -> Arc<Published<T>> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Store `table` under a new version. Returns the new version, or `None`
    /// when the table equals the current one.
    pub fn publish(&self, table: T) -> Option<u64> {
        let current = self.current.load();
        if current.table == table {
            return None;
        }
        let version = current.version + 1;
        self.current.store(Arc::new(Published { version, table }));
        Some(version)
    }
}

impl<T: PartialEq + Default> Default for TablePublisher<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Write the JSON rendering of `table` to `path`.
pub fn dump_table<T: Serialize>(path: &Path, table: &T, pretty: bool) -> std::io::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(table)
    } else {
        serde_json::to_string(table)
    }
    .map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}
