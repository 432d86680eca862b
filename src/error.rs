//! Error handling for the catalogue client

use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for catalogue operations
#[derive(Error, Debug)]
pub enum Error {
    /// The requested record does not exist
    #[error("{collection} record not found: {id}")]
    NotFound { collection: String, id: String },

    /// Caller-side validation failed (e.g. a blank product name)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The document or object store rejected the request
    #[error("Backing store error (status {status}): {message}")]
    Store { status: u16, message: String },

    /// Writing an image to the object store failed
    #[error("Upload of image {index} failed: {message}")]
    Upload { index: usize, message: String },

    /// No free product identifier was found within the attempt budget
    #[error("No unique product identifier after {attempts} attempts")]
    IdentifierExhausted { attempts: usize },

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The session lacks the role the operation needs
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl Error {
    /// Create a new not-found error
    pub fn not_found(collection: &str, id: &str) -> Self {
        Error::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new conflict error
    pub fn conflict<T: fmt::Display>(msg: T) -> Self {
        Error::Conflict(msg.to_string())
    }

    /// Create a new backing store error
    pub fn store<T: fmt::Display>(status: u16, msg: T) -> Self {
        Error::Store {
            status,
            message: msg.to_string(),
        }
    }

    /// Create a new upload error
    pub fn upload<T: fmt::Display>(index: usize, msg: T) -> Self {
        Error::Upload {
            index,
            message: msg.to_string(),
        }
    }

    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new forbidden error
    pub fn forbidden<T: fmt::Display>(msg: T) -> Self {
        Error::Forbidden(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Whether this error reports a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Whether this error reports a uniqueness violation
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}
