//! One-shot compilation and the watch loop.
//!
//! # Responsibilities
//! - Load declarations and reconcile them into a controller
//! - Write the published tables to their output paths
//! - In watch mode, repeat on every declarations change until shutdown
//!
//! # Design Decisions
//! - Failing sources are reported and skipped; the rest still publish
//! - Tables are written only when their version moves
//! - The notify watcher lives exactly as long as the loop

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use crate::config::{load_sources, CompilerConfig, ConfigError, DeclarationWatcher, OutputConfig};
use crate::ingest::{Controller, SourceObject, SourceStatus};
use crate::lifecycle::shutdown::ShutdownListener;
use crate::publish::dump_table;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Table versions last written to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Written {
    pub route: Option<u64>,
    pub redirect: Option<u64>,
}

/// Build a controller from `sources` in one reconciliation pass.
pub fn compile_once(config: &CompilerConfig, sources: Vec<SourceObject>) -> (Controller, Vec<SourceStatus>) {
    let mut controller = Controller::new(config.modules.redirect_enabled);
    let statuses = controller.reconcile(sources);
    report(&statuses);
    (controller, statuses)
}

/// Log every failed source with its write-back status.
pub fn report(statuses: &[SourceStatus]) {
    for status in statuses.iter().filter(|s| !s.is_ok()) {
        tracing::warn!(
            source = %status.source,
            status = %status.status_value().render(),
            "Source failed to compile"
        );
    }
}

/// Write tables whose version differs from `written`.
pub fn write_tables(
    controller: &Controller,
    output: &OutputConfig,
    written: Written,
) -> Result<Written, RunError> {
    let mut now = written;

    let route = controller.route_table();
    if written.route != Some(route.version) {
        write(Path::new(&output.route_table_path), route.as_ref(), output.pretty)?;
        tracing::info!(path = %output.route_table_path, version = route.version, "Wrote route table");
        now.route = Some(route.version);
    }

    if let Some(redirect) = controller.redirect_table() {
        if written.redirect != Some(redirect.version) {
            write(Path::new(&output.redirect_table_path), redirect.as_ref(), output.pretty)?;
            tracing::info!(
                path = %output.redirect_table_path,
                version = redirect.version,
                "Wrote redirect table"
            );
            now.redirect = Some(redirect.version);
        }
    }

    Ok(now)
}

fn write<T: serde::Serialize>(path: &Path, table: &T, pretty: bool) -> Result<(), RunError> {
    dump_table(path, table, pretty).map_err(|source| RunError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Compile, write, then recompile on every declarations change until
/// `shutdown` fires.
pub async fn run_watch(
    config: CompilerConfig,
    mut shutdown: ShutdownListener,
) -> Result<(), RunError> {
    let path = PathBuf::from(&config.input.declarations_path);
    let sources = load_sources(&path)?;

    let (mut controller, _) = compile_once(&config, sources.clone());
    let mut written = write_tables(&controller, &config.output, Written::default())?;

    let (watcher, mut updates) = DeclarationWatcher::new(
        &path,
        Duration::from_secs(config.input.poll_interval_secs),
    );
    let _watcher = watcher.with_current(sources).run()?;

    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(sources) = update else {
                    tracing::warn!("Declarations watcher stopped");
                    break;
                };
                let statuses = controller.reconcile(sources);
                report(&statuses);
                written = write_tables(&controller, &config.output, written)?;
            }
            reason = shutdown.stopped() => {
                tracing::info!(%reason, "Watch loop stopping");
                break;
            }
        }
    }

    Ok(())
}
