//! Error types for wavepeaks.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PeaksError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Streaming errors
    #[error("extracting peaks: {message}")]
    Stream { message: String },

    #[error("writing to file: {path}: {message}")]
    PeaksWrite { path: String, message: String },

    // Pipeline errors
    #[error("Intermediary not available: {message}")]
    IntermediaryMissing { message: String },

    #[error("Invalid job: {message}")]
    InvalidJob { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PeaksError {
    /// Shorthand for a configuration value that failed validation.
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        PeaksError::ConfigInvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PeaksError>;
