//! rule-compiler
//!
//! Compiles ingress-like source objects into route and redirect tables.
//!
//! # Architecture Overview
//!
//! ```text
//!     declarations.json ──▶ config::loader ──▶ ingest::Controller
//!                                                 │
//!                          ┌──────────────────────┼──────────────────────┐
//!                          ▼                      ▼                      ▼
//!                   route RuleCompiler    redirect RuleCompiler    ServiceRegistry
//!                          │                      │
//!                          └──────────┬───────────┘
//!                                     ▼
//!                     compiler (classify → order → condition)
//!                                     │
//!                                     ▼
//!                       publish::TablePublisher ──▶ route / redirect files
//! ```
//!
//! # Commands
//! - `compile`: one pass, write both tables
//! - `check`: one pass, print per-source status, write nothing
//! - `watch`: compile, then recompile on every declarations change

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rule_compiler::config::{load_config, load_sources, CompilerConfig};
use rule_compiler::lifecycle::{self, Shutdown, Written};
use rule_compiler::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "rule-compiler")]
#[command(about = "Compile ingress declarations into route and redirect tables", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile once and write the tables
    Compile {
        /// Print the route table to stdout as well
        #[arg(long)]
        stdout: bool,
    },
    /// Compile once and print each source's status
    Check,
    /// Compile, then recompile whenever the declarations file changes
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => CompilerConfig::default(),
    };
    init_logging(&config.observability);

    tracing::info!(
        declarations = %config.input.declarations_path,
        redirect_enabled = config.modules.redirect_enabled,
        "rule-compiler v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "rule-compiler failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: CompilerConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Commands::Compile { stdout } => {
            let sources = load_sources(Path::new(&config.input.declarations_path))?;
            let (controller, statuses) = lifecycle::compile_once(&config, sources);
            lifecycle::write_tables(&controller, &config.output, Written::default())?;
            if stdout {
                println!("{}", serde_json::to_string_pretty(controller.route_table().as_ref())?);
            }
            Ok(exit_code(statuses.iter().all(|s| s.is_ok())))
        }
        Commands::Check => {
            let sources = load_sources(Path::new(&config.input.declarations_path))?;
            let (_, statuses) = lifecycle::compile_once(&config, sources);
            for status in &statuses {
                println!("{}\t{}", status.source, status.status_value().render());
            }
            Ok(exit_code(statuses.iter().all(|s| s.is_ok())))
        }
        Commands::Watch => {
            let shutdown = Shutdown::new();
            let listener = shutdown.listener();
            let signals = lifecycle::spawn_signal_handler(shutdown.clone());
            lifecycle::run_watch(config, listener).await?;
            signals.abort();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(all_ok: bool) -> ExitCode {
    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
