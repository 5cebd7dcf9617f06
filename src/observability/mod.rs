//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Whatever metrics recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (`kind`, `source`, `host`, `path`) on every rule event
//! - Metrics go through the `metrics` facade; this crate installs no exporter
//! - Recording is cheap enough to sit on the put path

pub mod logging;
pub mod metrics;
