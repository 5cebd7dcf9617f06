//! Declaration storage subsystem.
//!
//! # Data Flow
//! ```text
//! put(declaration)
//!     → conflict.rs (scan bucket for an annotation-equal occupant)
//!     → index.rs (insert / replace in place / no-op, or reject)
//!
//! delete_by_source(source)
//!     → index.rs (secondary index lookup, prune empty buckets)
//! ```
//!
//! # Design Decisions
//! - The index exclusively owns declaration records; readers get references
//!   or copies
//! - A conflict never leaves a partial write behind
//! - Single writer: callers sharing an index across threads must hold one
//!   lock around each `put`, since the scan and the mutation are one step

pub mod conflict;
pub mod declaration;
pub mod index;

pub use declaration::{Annotations, Declaration, Extension, RuleKind};
pub use index::{Bucket, PutOutcome, RuleIndex};
