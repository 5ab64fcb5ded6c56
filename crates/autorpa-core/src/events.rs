//! Session lifecycle notifications.

use serde::{Deserialize, Serialize};

/// Why a session was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseReason {
    /// A close step or host request.
    Requested,
    /// The provider reported that the last page closed.
    AllPagesClosed,
    /// A cancelled run cleaned up after itself.
    Cancelled,
    /// The registry was shut down.
    Shutdown,
}

/// Broadcast to every subscriber of a session registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SessionEvent {
    #[serde(rename_all = "camelCase")]
    SessionClosed {
        session_id: String,
        reason: CloseReason,
    },
}

impl SessionEvent {
    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::SessionClosed { session_id, .. } => session_id,
        }
    }
}
