//! Error types for view composition

use http::StatusCode;
use thiserror::Error;

/// Result type alias for view operations
pub type Result<T, E = ViewError> = std::result::Result<T, E>;

/// Errors raised while resolving or rendering views and layouts
///
/// Only [`ViewError::NotFound`] and [`ViewError::ConfigMissing`] are part of
/// the normal control flow. Fragment cache faults never surface here; they
/// are logged and treated as a cache miss.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The view or layout is absent from both the active and the default theme
    #[error("Unable to load the requested file: {0}")]
    NotFound(String),

    /// Required configuration is absent (e.g. no theme paths)
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Template parsing or rendering failed
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Template context could not be built from the request variables
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A located view could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal state became unusable (e.g. a poisoned lock)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ViewError {
    /// Create a not-found error for a logical view or layout name
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a serialization error
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Whether this error means the requested file does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status used when the error terminates a request
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for ViewError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<envy::Error> for ViewError {
    fn from(err: envy::Error) -> Self {
        Self::Config(err.to_string())
    }
}
