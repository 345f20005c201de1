//! Core error types for caseflow-core.
//!
//! This module defines the error hierarchy using thiserror. Ingestion
//! problems (bad timestamps, unreadable logs) and configuration problems
//! get their own enums so callers can match on the failure class.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for caseflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Event-log ingestion errors
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A window name was processed twice. Window reports are attributed
    /// by name, so a duplicate would silently merge two time slices.
    #[error("Duplicate window name: '{0}' was already processed")]
    DuplicateWindow(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Event-log ingestion errors.
///
/// Row-level failures (malformed timestamps, bad booleans) surface as
/// [`CoreError::Csv`] with the offending value in the message; the
/// engine never substitutes defaults for them.
#[derive(Error, Debug)]
pub enum LogError {
    /// The input log contained no events at all.
    #[error("Event log at {path} is empty")]
    EmptyLog { path: PathBuf },

    /// A split-log directory is missing its initial log.
    #[error("No initial log found in {dir}")]
    MissingInitialLog { dir: PathBuf },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
