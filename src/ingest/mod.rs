//! Source ingestion subsystem.
//!
//! # Data Flow
//! ```text
//! SourceEvent::{Upsert, Delete} (from the watching collaborator)
//!     → resource.rs (source object → validated path rules)
//!     → controller.rs (route + redirect compilers, rollback on error)
//!     → compile → publish
//!     → SourceStatus per event (status write-back)
//! ```
//!
//! # Design Decisions
//! - Every source is applied atomically and independently
//! - The status annotation is stripped before declarations are built
//! - Referenced backend services are tracked per controller instance

pub mod controller;
pub mod registry;
pub mod resource;

pub use controller::{Controller, SourceEvent, SourceStatus};
pub use registry::ServiceRegistry;
pub use resource::{HostRule, HttpPath, PathType, ServiceBackend, SourceObject};
