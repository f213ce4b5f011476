//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout orgchart.
//! Every error carries a stable code so the dispatcher can log it uniformly.
//!
//! # Error Categories
//! - `ConnectionFailed`: Database connection or pool errors
//! - `QueryFailed`: Statement execution errors (including constraint violations)
//! - `InvalidInput`: Missing choices or malformed values
//! - `EngineError`: Engine-specific errors (row decoding, driver quirks)
//! - `ConfigError`: Connection settings that could not be resolved
//! - `PromptFailed`: The terminal prompt library failed (EOF, interrupted, no TTY)
//! - `NotFound`: An update or delete matched no row

use thiserror::Error;

/// Main error type for orgchart operations
#[derive(Error, Debug)]
pub enum OrgError {
    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Invalid input or nothing to choose from
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Engine-specific database error
    #[error("Engine error ({engine}): {detail}")]
    EngineError { engine: String, detail: String },

    /// Configuration error (missing variable, invalid config file, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Interactive prompt failed
    #[error("Prompt failed: {0}")]
    PromptFailed(String),

    /// Target row does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl OrgError {
    /// Convert error to a stable error code string
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::EngineError { .. } => "ENGINE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::PromptFailed(_) => "PROMPT_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
        }
    }

    /// Get human-readable error message
    ///
    /// Messages never contain the connection password.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an engine-specific error
    pub fn engine_error(engine: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::EngineError { engine: engine.into(), detail: detail.into() }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a prompt failure error
    pub fn prompt_failed(message: impl Into<String>) -> Self {
        Self::PromptFailed(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl From<dialoguer::Error> for OrgError {
    fn from(err: dialoguer::Error) -> Self {
        Self::prompt_failed(err.to_string())
    }
}

/// Result type alias for orgchart operations
pub type Result<T> = std::result::Result<T, OrgError>;
