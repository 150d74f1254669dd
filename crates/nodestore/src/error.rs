//! Error types for the node store.
//!
//! The hierarchy separates caller mistakes ([`ValidationError`]), failures of the
//! underlying document store ([`BackendError`]) and payloads that cannot be
//! decoded ([`CodecError`]), so a caller can tell a store outage apart from
//! corrupted data.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::backends::elasticsearch::DocumentStoreError;
use crate::codec::CodecError;

/// The primary error type for all node store operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Input validation errors, raised before anything is sent to the store
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A stored payload could not be decoded
    #[error("corrupt data: {0}")]
    CorruptData(#[from] CodecError),
}

impl StorageError {
    /// Returns `true` if the error was raised by input validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, StorageError::Validation(_))
    }

    /// Returns `true` if the error reports an undecodable payload.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, StorageError::CorruptData(_))
    }
}

/// Errors related to caller input and configuration.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A node id was empty.
    #[error("id cannot be empty")]
    EmptyId,

    /// The index naming pattern cannot produce date-partitioned names.
    #[error("invalid index pattern '{pattern}': {message}")]
    InvalidIndexPattern { pattern: String, message: String },

    /// A configuration value is out of range.
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfig { field: String, message: String },

    /// A retention cutoff could not be parsed.
    #[error("invalid cutoff '{input}': {message}")]
    InvalidCutoff { input: String, message: String },
}

/// Errors originating from the document store backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// The backend is reachable but not able to serve requests.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// A store request failed.
    #[error("{operation} failed on {backend_name} for '{target}': {source}")]
    Request {
        backend_name: String,
        operation: &'static str,
        target: String,
        #[source]
        source: DocumentStoreError,
    },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BackendError {
    /// Wraps a document store failure with the operation and target it hit.
    pub fn request(
        backend_name: &str,
        operation: &'static str,
        target: impl Into<String>,
        source: DocumentStoreError,
    ) -> Self {
        BackendError::Request {
            backend_name: backend_name.to_string(),
            operation,
            target: target.into(),
            source,
        }
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "unknown".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}
