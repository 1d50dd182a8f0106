use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid value for '{field}': expected {expected}")]
    Validation { field: String, expected: String },

    #[error("Transport mode '{0}' is not supported")]
    InvalidTransportMode(String),

    #[error("Reference entry '{0}' not found")]
    NotFound(String),

    #[error("Historical emissions data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Internal computation failed: {0}")]
    InternalComputation(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to serialize JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}

impl EngineError {
    pub fn validation(field: &str, expected: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.to_string(),
            expected: expected.into(),
        }
    }

    /// Validation and unsupported-mode errors are the caller's fault; everything
    /// else is ours.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::Validation { .. } | EngineError::InvalidTransportMode(_)
        )
    }
}
