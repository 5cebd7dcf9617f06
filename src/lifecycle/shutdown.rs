//! Stop requests for the watch loop.
//!
//! Whoever may end `watch` (the Ctrl-C task, tests) holds a [`Shutdown`]
//! handle. The loop holds a [`ShutdownListener`] and logs the
//! [`StopReason`] it was given.

use std::fmt;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Why the watch loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ctrl-C / SIGINT.
    Interrupted,
    Requested,
    /// Every `Shutdown` handle was dropped.
    Abandoned,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StopReason::Interrupted => "interrupted",
            StopReason::Requested => "requested",
            StopReason::Abandoned => "abandoned",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<StopReason>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Create listeners before spawning the loops that wait on them; a stop
    /// sent earlier is not seen.
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Ask every listener to stop. False when nobody is listening.
    pub fn stop(&self, reason: StopReason) -> bool {
        self.tx.send(reason).is_ok()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ShutdownListener {
    rx: broadcast::Receiver<StopReason>,
}

impl ShutdownListener {
    /// Resolves on the first stop request. Cancel safe, so it can sit in a
    /// `select!` arm.
    pub async fn stopped(&mut self) -> StopReason {
        loop {
            match self.rx.recv().await {
                Ok(reason) => return reason,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return StopReason::Abandoned,
            }
        }
    }
}
