//! Step execution result types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Side effects a step left behind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideEffects {
    /// Session opened, reused or closed by the step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// File written by the step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Run variable the step's data was stored under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,

    /// Anything else worth reporting.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SideEffects {
    pub fn is_empty(&self) -> bool {
        self.session_id.is_none()
            && self.file_path.is_none()
            && self.variable.is_none()
            && self.extra.is_empty()
    }
}

/// Result of running one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Whether the step succeeded.
    pub success: bool,

    /// Output data, if the step produces any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Human-readable error when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "SideEffects::is_empty")]
    pub side_effects: SideEffects,
}

impl ExecutionResult {
    /// A successful result without data.
    pub fn success() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            side_effects: SideEffects::default(),
        }
    }

    /// A successful result carrying output data.
    pub fn success_with(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::success()
        }
    }

    /// A failed result.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            side_effects: SideEffects::default(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.side_effects.session_id = Some(session_id.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.side_effects.file_path = Some(path.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.side_effects.variable = Some(name.into());
        self
    }

    pub fn with_side_effect(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.side_effects.extra.insert(key.into(), value);
        self
    }

    /// Session id recorded in the side effects.
    pub fn session_id(&self) -> Option<&str> {
        self.side_effects.session_id.as_deref()
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
