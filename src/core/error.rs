//! Configuration error types

use thiserror::Error;

/// Errors raised while locating or normalizing the plugin configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to parse plugin configuration: {0}")]
    MalformedDocument(String),

    #[error("could not find a configuration block for plugin '{0}'")]
    ConfigNotFound(String),

    #[error("'{field}' must be a list of KEY or KEY=VALUE strings")]
    InvalidEnvShape { field: String },

    #[error("watch[{rule}].path must be a string or a list of strings")]
    InvalidPathShape { rule: usize },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::MalformedDocument(err.to_string())
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
