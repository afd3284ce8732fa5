//! Errors that end up in the single error slot of [crate::app::state::AppState]. Their
//! [Display] output is exactly what the user sees.

use std::fmt::Display;

use thiserror::Error;

/// Problems with form input. Detected before any request to the store is made.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Some fields have not been filled in.")]
    MissingField,
    #[error("Study time must be entered as a number.")]
    NotNumeric,
}

/// Store request failures, one per operation. The underlying cause is logged, not displayed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailure {
    #[error("An error occurred while fetching records.")]
    Load,
    #[error("An error occurred while saving the record.")]
    Save,
    #[error("An error occurred while deleting the record.")]
    Delete,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteFailure),
}

impl UserError {
    pub fn is_validation(&self) -> bool {
        matches!(self, UserError::Validation(_))
    }
}

/// Convenience for rendering an optional error slot. Empty slot renders as an empty string.
pub fn error_banner(error: Option<&impl Display>) -> String {
    error.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{error_banner, RemoteFailure, UserError, ValidationError};

    #[test]
    fn test_user_error_displays_inner_message() {
        let error = UserError::from(ValidationError::MissingField);
        assert_eq!(error.to_string(), "Some fields have not been filled in.");
        assert!(error.is_validation());

        let error = UserError::from(RemoteFailure::Delete);
        assert_eq!(error.to_string(), "An error occurred while deleting the record.");
        assert!(!error.is_validation());
    }

    #[test]
    fn test_error_banner() {
        assert_eq!(error_banner(None::<&UserError>), "");
        assert_eq!(
            error_banner(Some(&UserError::from(RemoteFailure::Load))),
            "An error occurred while fetching records."
        );
    }
}
