//! Error types for ragchat.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phrases the remote service uses when a session cannot be started because
/// the configured credentials are unusable.
const CREDENTIAL_FAILURE_PHRASES: [&str; 2] =
    ["api key not valid", "requested entity was not found"];

/// A shared error type for the entire ragchat workspace.
///
/// Variants follow the failure classes a session can observe.
/// `MalformedResponse` is reserved for model output that the suggestion
/// parser cannot use; it is absorbed there and never reaches the user.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RagError {
    /// Invalid or missing API key
    #[error("Credential error: {0}")]
    Credential(String),

    /// Connection-level failure, no response was received
    #[error("Network error: {0}")]
    TransientNetwork(String),

    /// Store or operation vanished on the remote side
    #[error("Not found: {0}")]
    NotFound(String),

    /// Model output the suggestion parser could not interpret
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A single file's ingestion operation failed
    #[error("Upload failed for '{file_name}': {message}")]
    UploadFailure { file_name: String, message: String },

    /// An operation needed an active store but the session has none
    #[error("No active store")]
    NoActiveStore,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Everything else
    #[error("{0}")]
    Unknown(String),
}

impl RagError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Credential error
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential(message.into())
    }

    /// Creates a TransientNetwork error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientNetwork(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates a MalformedResponse error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Creates an UploadFailure error
    pub fn upload_failure(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UploadFailure {
            file_name: file_name.into(),
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Unknown error
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a connection-level failure worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error means the session could not start because of credentials.
    ///
    /// Returns true for:
    /// - `Credential` errors
    /// - any error whose text contains "api key not valid" or
    ///   "requested entity was not found" (case-insensitive)
    ///
    /// The text fallback covers responses whose status carries no usable code.
    pub fn is_credential_failure(&self) -> bool {
        if matches!(self, Self::Credential(_)) {
            return true;
        }
        let lower = self.to_string().to_lowercase();
        CREDENTIAL_FAILURE_PHRASES
            .iter()
            .any(|phrase| lower.contains(phrase))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for RagError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for RagError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl From<toml::de::Error> for RagError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unknown(err.to_string())
    }
}

/// A type alias for `Result<T, RagError>`.
pub type Result<T> = std::result::Result<T, RagError>;
