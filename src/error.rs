//! Error types for framelock.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FramelockError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Observation errors
    #[error("Label '{label}' is not in the declared alphabet")]
    InvalidLabel { label: String },

    #[error("Observer failed: {message}")]
    Observer { message: String },

    // Dispatch errors
    #[error("Dispatch failed: {message}")]
    Dispatch { message: String },

    #[error("Dispatch tool not found: {tool}")]
    DispatchToolNotFound { tool: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, FramelockError>;
