//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the compiler.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the rule compiler.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct CompilerConfig {
    /// Where source declarations come from.
    pub input: InputConfig,

    /// Where rendered tables go.
    pub output: OutputConfig,

    /// Which rule compilers run.
    pub modules: ModulesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Input configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// JSON file holding the current list of source objects.
    pub declarations_path: String,

    /// Poll interval for the file watcher in seconds.
    pub poll_interval_secs: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            declarations_path: "declarations.json".to_string(),
            poll_interval_secs: 2,
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Route table destination.
    pub route_table_path: String,

    /// Redirect table destination.
    pub redirect_table_path: String,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            route_table_path: "route_rule.data".to_string(),
            redirect_table_path: "redirect.data".to_string(),
            pretty: true,
        }
    }
}

/// Rule compiler selection.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ModulesConfig {
    /// Compile redirect rules alongside route rules.
    pub redirect_enabled: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            redirect_enabled: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
