//! Declarations file watcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_sources;
use crate::ingest::SourceObject;

/// Monitors the declarations file and sends each changed snapshot.
pub struct DeclarationWatcher {
    path: PathBuf,
    poll_interval: Duration,
    current: Option<Vec<SourceObject>>,
    update_tx: mpsc::UnboundedSender<Vec<SourceObject>>,
}

impl DeclarationWatcher {
    /// Returns the watcher and a receiver for declaration snapshots.
    pub fn new(
        path: &Path,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Vec<SourceObject>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                poll_interval,
                current: None,
                update_tx,
            },
            update_rx,
        )
    }

    /// Snapshot already applied; an identical reload is not sent.
    pub fn with_current(mut self, current: Vec<SourceObject>) -> Self {
        self.current = Some(current);
        self
    }

    /// Start watching the file in a background thread.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let mut last = self.current;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    match load_sources(&path) {
                        Ok(sources) => {
                            if last.as_ref() == Some(&sources) {
                                tracing::debug!("Declarations unchanged, skipping reload");
                                return;
                            }
                            tracing::info!(
                                sources = sources.len(),
                                "Declarations change detected, reloading..."
                            );
                            last = Some(sources.clone());
                            let _ = tx.send(sources);
                        }
                        Err(e) => {
                            tracing::error!(
                                "Failed to reload declarations: {}. Keeping current rules.",
                                e
                            );
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Declarations watcher started");
        Ok(watcher)
    }
}
