//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! compile / check (run.rs):
//!     Load declarations → Controller::reconcile → write tables
//!
//! watch (run.rs):
//!     compile → DeclarationWatcher → reconcile per change → write tables
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     Ctrl-C → Shutdown::stop(Interrupted) → watch loop exits
//! ```
//!
//! # Design Decisions
//! - Fail fast: a bad config or unreadable declarations file is fatal
//! - Individual source failures are never fatal
//! - Shutdown is a broadcast so any number of tasks can observe it

pub mod run;
pub mod shutdown;
pub mod signals;

pub use run::{compile_once, run_watch, write_tables, RunError, Written};
pub use shutdown::{Shutdown, ShutdownListener, StopReason};
pub use signals::spawn_signal_handler;
