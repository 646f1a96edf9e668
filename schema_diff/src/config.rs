//! Configuration handling for SchemaDiff

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    config.validate()?;
    Ok(config)
}

/// Represents the complete SchemaDiff configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub compare: CompareConfig,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.compare.max_partition_depth == 0 {
            return Err(Error::ConfigError(
                "compare.max_partition_depth must be at least 1".to_string(),
            ));
        }
        match self.output.format.as_str() {
            "text" | "json" | "sql" => {}
            other => {
                return Err(Error::ConfigError(format!(
                    "Unsupported output format: {}",
                    other
                )))
            }
        }
        crate::render::renderer_for(&self.output.dialect).map(|_| ())
    }
}

/// Comparison behaviour
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CompareConfig {
    /// Owner properties never cause a difference and are left out of creations
    pub ignore_owner: bool,
    /// Text values are compared with whitespace runs collapsed
    pub ignore_whitespace: bool,
    /// Upper bound on nested partition levels walked by the table orchestrator
    pub max_partition_depth: usize,
    /// Use `DROP TABLE ... CASCADE` for tables that only exist in the target
    pub drop_cascade: bool,
    /// Refuse to compare servers of different type or major version
    pub check_compatibility: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            ignore_owner: false,
            ignore_whitespace: false,
            max_partition_depth: 8,
            drop_cascade: false,
            check_compatibility: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

/// Output generation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// One of `text`, `json`, `sql`
    pub format: String,
    /// SQL dialect of the generated statements
    pub dialect: String,
    pub include_header: bool,
    pub wrap_in_transaction: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            dialect: "postgres".to_string(),
            include_header: true,
            wrap_in_transaction: true,
        }
    }
}
