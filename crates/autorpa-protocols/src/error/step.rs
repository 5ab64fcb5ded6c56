//! Step execution errors.

use thiserror::Error;

use super::{ProviderError, RegistryError, SessionError};

/// Errors produced while building or running a single step.
///
/// Only [`StepError::UnknownType`] crosses the executor boundary as an `Err`;
/// every other variant is folded into a failed
/// [`ExecutionResult`](crate::ExecutionResult).
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Unknown step type: {0}")]
    UnknownType(String),

    #[error("Parameter validation failed for {type_id}: {reason}")]
    Validation { type_id: String, reason: String },

    #[error("Step type {0} is declared but cannot be executed")]
    NotExecutable(String),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("No active browser session")]
    NoActiveSession,

    #[error(
        "Element '{selector}' not available after {attempts} attempts (retryCount={retry_count}): {last_error}"
    )]
    RetriesExhausted {
        selector: String,
        attempts: u32,
        retry_count: u32,
        last_error: ProviderError,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Execution was cancelled")]
    Cancelled,
}

impl StepError {
    /// Build a validation error for the given step type.
    pub fn validation(type_id: impl Into<String>, reason: impl Into<String>) -> Self {
        StepError::Validation {
            type_id: type_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error indicates a programming/configuration mistake that
    /// must propagate instead of becoming a failed result.
    pub fn is_hard(&self) -> bool {
        matches!(self, StepError::UnknownType(_))
    }
}

impl From<RegistryError> for StepError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::UnknownType(id) => StepError::UnknownType(id),
            RegistryError::DuplicateType(id) => {
                StepError::validation(id, "step type registered twice")
            }
            RegistryError::InvalidDefinition { type_id, reason } => {
                StepError::validation(type_id, reason)
            }
        }
    }
}

impl From<SessionError> for StepError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::UnknownSession(id) => StepError::UnknownSession(id),
            SessionError::DuplicateSession(id) => {
                StepError::validation("BROWSER_OPEN", format!("session {id} registered twice"))
            }
            SessionError::Provider(p) => StepError::Provider(p),
        }
    }
}
