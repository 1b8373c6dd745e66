//! Wizard error types.

use thiserror::Error;

use super::step::WizardStep;
use super::validation::FieldErrors;
use crate::backend::BackendError;

/// Result type for wizard operations.
pub type WizardResult<T> = Result<T, WizardError>;

/// Errors returned by wizard actions.
///
/// None of these change the current step.
#[derive(Debug, Error)]
pub enum WizardError {
    /// Local validation failed; nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// A backend call failed.
    #[error("Backend call failed: {0}")]
    Remote(#[from] BackendError),

    /// The action is not allowed at the current step.
    #[error("Cannot {action} at step {from}")]
    InvalidTransition { from: WizardStep, action: &'static str },

    /// A remote call for this step is still in flight.
    #[error("A submission for step {0} is already in progress")]
    SubmissionPending(WizardStep),

    /// Data an earlier step should have collected is absent.
    #[error("Missing {0}")]
    MissingData(&'static str),

    /// The exporter failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl WizardError {
    /// Field errors, when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
