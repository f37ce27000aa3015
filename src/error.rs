//! Error types for the photos_audit crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while auditing a local folder against Google Photos.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("No usable credentials: the token cache is missing or expired and no authorization flow is available")]
    NoCredentials,

    #[error("OAuth state mismatch: expected {expected}, got {actual}")]
    StateMismatch { expected: String, actual: String },

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),

    #[error("Failed to read credentials file {path:?}: {source}")]
    CredentialsFileError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Not a valid directory: {0:?}")]
    InvalidDirectory(PathBuf),

    #[error("Failed to write report {path:?}: {source}")]
    ReportWriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for AuditError.
pub type Result<T> = std::result::Result<T, AuditError>;
