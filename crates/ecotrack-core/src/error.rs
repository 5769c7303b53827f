//! Core error types for ecotrack-core.
//!
//! Remote-store errors live in [`crate::remote::RemoteError`] as a closed
//! three-kind enum; everything else funnels into [`CoreError`] here.

use thiserror::Error;

/// Core error type for ecotrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Local key-value store errors
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    /// Remote data-store errors
    #[error("Remote error: {0}")]
    Remote(#[from] crate::remote::RemoteError),

    /// Authentication errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Local key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open local store at {path}: {message}")]
    OpenFailed { path: String, message: String },

    /// Read or write against the kv table failed
    #[error("Local store query failed: {0}")]
    QueryFailed(String),

    /// Stored value could not be decoded
    #[error("Corrupt value for key '{key}': {message}")]
    CorruptValue { key: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::QueryFailed(err.to_string())
    }
}

/// Authentication collaborator errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Credentials were rejected
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The auth endpoint could not be reached or answered abnormally
    #[error("Auth request failed: {0}")]
    RequestFailed(String),

    /// No active session where one is required
    #[error("Not signed in")]
    NotSignedIn,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
