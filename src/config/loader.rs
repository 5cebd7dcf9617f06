//! Configuration and declaration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::CompilerConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::ingest::SourceObject;

/// Error type for configuration and declaration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Json(serde_json::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Json(e) => write!(f, "Declaration parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<CompilerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: CompilerConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load the full list of source objects from a JSON file.
pub fn load_sources(path: &Path) -> Result<Vec<SourceObject>, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_sources(&content)
}

pub fn parse_sources(content: &str) -> Result<Vec<SourceObject>, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(content).map_err(ConfigError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let path = std::env::temp_dir().join("rule_compiler_loader_invalid.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[input]\npoll_interval_secs = 0").unwrap();

        let result = load_config(&path);
        fs::remove_file(&path).ok();

        match result {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "input.poll_interval_secs");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/rule-compiler.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_parse_sources() {
        assert!(parse_sources("  \n").unwrap().is_empty());

        let sources = parse_sources(
            r#"[{"namespace": "ns", "name": "a", "creation_timestamp": 5, "rules": []}]"#,
        )
        .unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].key(), "ns/a");

        assert!(matches!(parse_sources("{"), Err(ConfigError::Json(_))));
    }
}
