//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CompilerConfig (validated, immutable)
//!
//! declarations file (JSON)
//!     → loader.rs (Vec<SourceObject>)
//!     → watcher.rs on change, unchanged snapshots skipped
//!     → lifecycle run loop → Controller::reconcile
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_sources, ConfigError};
pub use schema::{CompilerConfig, InputConfig, LogFormat, ModulesConfig, ObservabilityConfig, OutputConfig};
pub use watcher::DeclarationWatcher;
