//! Playwright backend errors.

use thiserror::Error;

use autorpa_protocols::ProviderError;

/// Playwright backend errors.
#[derive(Debug, Error)]
pub enum PlaywrightError {
    /// Bridge process failed to start.
    #[error("Bridge failed to start: {0}")]
    BridgeStartFailed(String),

    /// Bridge process exited while requests were outstanding.
    #[error("Bridge process died: {0}")]
    BridgeDied(String),

    /// Communication error with bridge.
    #[error("Bridge communication error: {0}")]
    CommunicationError(String),

    /// The bridge ran the method and Playwright raised.
    #[error("{message}")]
    Remote { kind: RemoteErrorKind, message: String },

    /// No response within the call's deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Bridge not running")]
    NotInitialized,

    #[error("Node.js not found. Install Node.js >= 18 or set playwright.node_path")]
    NodeNotFound,

    #[error("Playwright not installed. Run: npm install -g playwright && npx playwright install")]
    PlaywrightNotInstalled,
}

/// Failure class reported by the bridge script alongside its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteErrorKind {
    Timeout,
    Launch,
    Navigation,
    BrowserNotFound,
    ContextNotFound,
    PageNotFound,
    ElementNotFound,
    NotInstalled,
    #[default]
    #[serde(other)]
    Other,
}

impl From<std::io::Error> for PlaywrightError {
    fn from(e: std::io::Error) -> Self {
        PlaywrightError::CommunicationError(e.to_string())
    }
}

impl From<serde_json::Error> for PlaywrightError {
    fn from(e: serde_json::Error) -> Self {
        PlaywrightError::CommunicationError(format!("JSON error: {}", e))
    }
}

impl From<PlaywrightError> for ProviderError {
    fn from(e: PlaywrightError) -> Self {
        match e {
            PlaywrightError::Remote { kind, message } => match kind {
                RemoteErrorKind::Timeout => ProviderError::Timeout(message),
                RemoteErrorKind::Launch => ProviderError::LaunchFailed(message),
                RemoteErrorKind::Navigation => ProviderError::NavigationFailed(message),
                RemoteErrorKind::BrowserNotFound => ProviderError::BrowserNotFound(message),
                RemoteErrorKind::ContextNotFound => ProviderError::ContextNotFound(message),
                RemoteErrorKind::PageNotFound => ProviderError::PageNotFound(message),
                RemoteErrorKind::ElementNotFound => ProviderError::ElementNotFound(message),
                RemoteErrorKind::NotInstalled => {
                    ProviderError::Bridge(PlaywrightError::PlaywrightNotInstalled.to_string())
                }
                RemoteErrorKind::Other => ProviderError::ActionFailed(message),
            },
            PlaywrightError::Timeout(message) => ProviderError::Timeout(message),
            PlaywrightError::NotInitialized => ProviderError::NotInitialized,
            other => ProviderError::Bridge(other.to_string()),
        }
    }
}
