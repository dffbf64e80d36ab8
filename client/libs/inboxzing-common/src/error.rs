//! Collaborator error handling shared by the client core crates
//!
//! Every external call (catalog, preference persist, points update, mark-as-read)
//! fails with the same error type so the core can decide how to surface it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for collaborator calls
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// Failure reported by an external collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error_type", content = "details")]
pub enum CollaboratorError {
    /// Request never reached the backend or the connection dropped
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Backend answered with a non-success status
    #[error("Rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Response body could not be parsed
    #[error("Decode error: {0}")]
    Decode(String),
}

impl CollaboratorError {
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// HTTP status reported by the backend, if it answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is a retryable error
    ///
    /// Transport failures and 5xx/429 answers are retried by the sync worker;
    /// client errors and undecodable bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) => false,
        }
    }
}
