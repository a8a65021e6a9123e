//! Configuration Parser
//!
//! Handles loading run configurations from YAML files and validating
//! them before the run starts.

use std::fs;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use super::model::Config;
use super::validator::{validate_config, ValidationError};

/// Errors that abort a run before any test case is scheduled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// Parses and validates a configuration from YAML text.
pub fn parse_config(yaml_content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(yaml_content)?;

    info!(
        "Parsed {} test cases, {} API headers",
        config.test_cases.len(),
        config.api.headers.len()
    );

    validate_config(&config)?;
    Ok(config)
}

/// Loads a configuration from a YAML file.
///
/// The file must contain `api` and `test_cases` sections; `settings`
/// is optional.
///
/// # Example
///
/// ```rust,no_run
/// use apirunner::workflow::load_config;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_config("config.yaml")?;
///     println!("Loaded {} test cases", config.test_cases.len());
///     Ok(())
/// }
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    let yaml_content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    debug!("YAML content loaded ({} bytes)", yaml_content.len());

    let config = parse_config(&yaml_content)?;
    info!("Configuration loaded successfully from {}", path.display());
    Ok(config)
}

/// Saves a configuration to a YAML file.
pub fn save_config(
    config: &Config,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let yaml_content = serde_yaml::to_string(config)?;
    fs::write(path.as_ref(), yaml_content)?;
    info!("Configuration saved to: {}", path.as_ref().display());
    Ok(())
}
