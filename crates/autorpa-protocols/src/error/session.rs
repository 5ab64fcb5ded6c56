//! Session registry errors.

use thiserror::Error;

use super::ProviderError;

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Session already registered: {0}")]
    DuplicateSession(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
