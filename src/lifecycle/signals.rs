//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for Ctrl-C / SIGINT
//! - Translate it into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - There is nothing to drain: the loop stops between batches

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::{Shutdown, StopReason};

/// Stop `shutdown`'s listeners on the first Ctrl-C.
pub fn spawn_signal_handler(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, shutting down");
                shutdown.stop(StopReason::Interrupted);
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for interrupt"),
        }
    })
}
