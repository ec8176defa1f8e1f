//! Error types for kop-performa

use thiserror::Error;

/// Performa operation error
#[derive(Debug, Error)]
pub enum PerformaError {
    /// Malformed period string or out-of-range year/month
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// No performa record exists for the requested organization and period
    #[error("Performa not found: {0}")]
    NotFound(String),

    /// Sub-form save attempted before the parent performa id was resolved
    #[error("Missing parent performa for {0}")]
    MissingParent(String),

    /// Backend or transport failure; `message` is safe to show to the user
    #[error("{message}")]
    RemoteFailure {
        /// HTTP status, when a response was received at all
        status: Option<u16>,
        message: String,
    },

    /// Form value outside its allowed range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// kop-common error
    #[error("Common error: {0}")]
    Common(#[from] kop_common::Error),
}

impl PerformaError {
    /// User-facing message for notification toasts
    pub fn user_message(&self) -> String {
        match self {
            PerformaError::RemoteFailure { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for performa operations
pub type Result<T> = std::result::Result<T, PerformaError>;
