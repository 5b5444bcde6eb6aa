//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No platform config directory available")]
    NoConfigDir,

    #[error("Config file {0} already exists")]
    AlreadyExists(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid regex in {field} ({pattern}): {message}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        message: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
