//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (poll interval > 0, known log level)
//! - Detect output paths that would overwrite each other
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CompilerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::CompilerConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &CompilerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.input.declarations_path.trim().is_empty() {
        errors.push(ValidationError {
            field: "input.declarations_path",
            message: "must not be empty".to_string(),
        });
    }

    if config.input.poll_interval_secs == 0 {
        errors.push(ValidationError {
            field: "input.poll_interval_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.output.route_table_path.trim().is_empty() {
        errors.push(ValidationError {
            field: "output.route_table_path",
            message: "must not be empty".to_string(),
        });
    }

    if config.modules.redirect_enabled {
        if config.output.redirect_table_path.trim().is_empty() {
            errors.push(ValidationError {
                field: "output.redirect_table_path",
                message: "must not be empty when redirect is enabled".to_string(),
            });
        } else if config.output.redirect_table_path == config.output.route_table_path {
            errors.push(ValidationError {
                field: "output.redirect_table_path",
                message: "must differ from output.route_table_path".to_string(),
            });
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: format!(
                "unknown level '{}', expected one of {}",
                config.observability.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&CompilerConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = CompilerConfig::default();
        config.input.poll_interval_secs = 0;
        config.output.redirect_table_path = config.output.route_table_path.clone();
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "input.poll_interval_secs",
                "output.redirect_table_path",
                "observability.log_level"
            ]
        );
    }

    #[test]
    fn test_redirect_path_ignored_when_disabled() {
        let mut config = CompilerConfig::default();
        config.modules.redirect_enabled = false;
        config.output.redirect_table_path = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
