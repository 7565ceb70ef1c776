use miette::Diagnostic;
use std::fmt::Display;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Validation error: {0}")]
    #[diagnostic(code(lifedesk::validation))]
    Validation(String),

    #[error("{kind} `{id}` was not found")]
    #[diagnostic(code(lifedesk::not_found))]
    NotFound { kind: String, id: String },

    #[error("{operation} failed for `{target}`: {message}")]
    #[diagnostic(code(lifedesk::adapter))]
    Adapter {
        operation: String,
        target: String,
        message: String,
    },

    #[error("Conflict: {0}")]
    #[diagnostic(code(lifedesk::conflict))]
    Conflict(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(lifedesk::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(lifedesk::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(lifedesk::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(lifedesk::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(lifedesk::other))]
    Other(String),
}

impl Error {
    /// True when the error says the referenced record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type DeskResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create validation errors
pub fn validation_error(message: &str) -> Error {
    Error::Validation(message.to_string())
}

/// Helper to create not-found errors
pub fn not_found(kind: &str, id: &str) -> Error {
    Error::NotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
}

/// Helper to create errors for a failed collaborator call
pub fn adapter_error(operation: &str, target: &str, message: impl Display) -> Error {
    Error::Adapter {
        operation: operation.to_string(),
        target: target.to_string(),
        message: message.to_string(),
    }
}

/// Helper to create conflict errors
pub fn conflict_error(message: &str) -> Error {
    Error::Conflict(message.to_string())
}
