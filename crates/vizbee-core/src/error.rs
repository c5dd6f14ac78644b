use thiserror::Error;

use crate::{report::format_errors, schema::SchemaErrors};

/// Everything that can go wrong before the agent has a usable configuration.
///
/// All variants are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{path}` not found")]
    NotFound { path: String },

    #[error("Error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error parsing config: \n{name} not found in environment.")]
    MissingEnvironmentVariable { name: String },

    #[error("Error parsing config: {0}")]
    Syntax(#[from] serde_yaml::Error),

    #[error("Error parsing config: {0}")]
    Schema(SchemaErrors),

    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl ConfigError {
    /// User-facing message. Schema violations are rendered as a text block,
    /// separated by blank lines when the output is a terminal.
    pub fn describe(&self, interactive: bool) -> String {
        match self {
            ConfigError::Schema(errors) => format!(
                "Error parsing config: {}",
                format_errors(&errors.to_value(), interactive)
            ),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
