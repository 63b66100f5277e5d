use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Engine-wide knobs. Every field has a default so a partial JSON document
/// (or none at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Nested expression evaluations allowed before `DepthExceeded`.
    #[serde(default = "default_max_evaluation_depth")]
    pub max_evaluation_depth: usize,

    /// `$<` nesting accepted by the parser.
    #[serde(default = "default_max_parse_depth")]
    pub max_parse_depth: usize,

    #[serde(default = "default_true")]
    pub cache_expressions: bool,

    #[serde(default)]
    pub quiet: bool,

    #[serde(default)]
    pub evaluate_for_buildsystem: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_evaluation_depth: default_max_evaluation_depth(),
            max_parse_depth: default_max_parse_depth(),
            cache_expressions: default_true(),
            quiet: false,
            evaluate_for_buildsystem: false,
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_evaluation_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_evaluation_depth must be at least 1".to_string(),
            ));
        }
        if self.max_parse_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_parse_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_max_evaluation_depth() -> usize {
    100
}

fn default_max_parse_depth() -> usize {
    100
}

fn default_true() -> bool {
    true
}
