//! Capability provider errors.

use thiserror::Error;

/// Errors raised by a [`CapabilityProvider`](crate::CapabilityProvider) implementation.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Timed out after {timeout_ms}ms waiting for selector '{selector}'")]
    SelectorTimeout { selector: String, timeout_ms: u64 },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Browser not found: {0}")]
    BrowserNotFound(String),

    #[error("Browser context not found: {0}")]
    ContextNotFound(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Provider not initialized")]
    NotInitialized,

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl ProviderError {
    /// Whether the failure may clear up on its own (an element that has not
    /// rendered yet). Only these are eligible for selector-wait retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::SelectorTimeout { .. } | ProviderError::ElementNotFound(_)
        )
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(e: std::io::Error) -> Self {
        ProviderError::Io(e.to_string())
    }
}
