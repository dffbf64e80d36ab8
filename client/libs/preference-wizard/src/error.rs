//! Error types for the preference wizard

use inboxzing_common::CollaboratorError;
use thiserror::Error;

/// Result type for wizard operations
pub type WizardResult<T> = Result<T, WizardError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// Required field missing at the current step
    #[error("Validation error: {0}")]
    Validation(String),

    /// Source cap hit, selection unchanged
    #[error("Capacity exceeded: at most {limit} sources")]
    CapacityExceeded { limit: usize },

    /// Operation invoked out of sequence
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Catalog has not arrived yet (or failed to load)
    #[error("Option catalog is not available")]
    CatalogUnavailable,

    /// Value outside the option set for that field
    #[error("Unknown {field} option: {value}")]
    UnknownOption { field: &'static str, value: String },

    /// Catalog or preference backend failed
    #[error("Collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),
}

impl WizardError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn unknown(field: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownOption {
            field,
            value: value.into(),
        }
    }

    /// Inline text shown to the user under the current step
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::CapacityExceeded { limit } => {
                format!("You can only select up to {} sources.", limit)
            }
            Self::CatalogUnavailable => {
                "News sources are still loading. Please try again in a moment.".to_string()
            }
            Self::UnknownOption { field, .. } => format!("Please choose a valid {}.", field),
            Self::Collaborator(_) => "Failed to update preferences. Please try again.".to_string(),
            Self::InvalidState(message) => message.clone(),
        }
    }

    /// Errors the user can fix from the UI
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidState(_))
    }
}
