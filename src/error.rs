//! Error types for the gdrive_push crate.

use thiserror::Error;

/// Errors that can occur when interacting with Google Drive.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Not a valid file path: {0:?}")]
    InvalidFilename(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to read local file: {0}")]
    FileReadError(#[from] std::io::Error),
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
