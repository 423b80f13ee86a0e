//! Error types for the AGRIS client core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the AGRIS client core.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AgrisError {
    /// Auth provider error (session retrieval, sign-out)
    #[error("Auth provider error: {0}")]
    Provider(String),

    /// HTTP transport error (connect, timeout)
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Backend API returned a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Local storage error (preference files)
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgrisError {
    /// Creates a Provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Creates an Api error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an API-status error
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Check if this error came from the auth provider
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<reqwest::Error> for AgrisError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<std::io::Error> for AgrisError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AgrisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AgrisError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for AgrisError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<String> for AgrisError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, AgrisError>`.
pub type Result<T> = std::result::Result<T, AgrisError>;
