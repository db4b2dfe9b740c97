//! Error types for the QA Agent.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, generation backend, knowledge
//! store, prompt rendering and caller input.

use thiserror::Error;

/// Unified error type for the QA Agent.
///
/// Parse degradation and generation-backend outages are recovered locally and
/// never surface as `AppError` to callers of the pipeline. `Input` is the
/// class reserved for mistakes made by the caller.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation backend errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge store and vector index errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Invalid input supplied by the caller (bad test case, missing knowledge base)
    #[error("Invalid input: {0}")]
    Input(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error was caused by the caller rather than the system.
    pub fn is_input_error(&self) -> bool {
        matches!(self, AppError::Input(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(AppError::Input("bad test case".to_string()).is_input_error());
        assert!(!AppError::Llm("timeout".to_string()).is_input_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
