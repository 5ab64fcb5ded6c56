//! Step instances.

use serde::{Deserialize, Serialize};

use super::ParamValues;

/// Canvas position of a step. Opaque to the executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A parameter-bound step inside a workflow.
///
/// `type_id` is a lookup key into the step type registry, resolved at use
/// time. `param_values` may be edited after construction, so the executor
/// re-validates before running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(rename = "params", alias = "paramValues", default)]
    pub param_values: ParamValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl StepInstance {
    /// A step with no stored parameters. Missing values fall back to schema
    /// defaults when the step runs.
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            param_values: ParamValues::new(),
            position: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.param_values.insert(key.into(), value);
        self
    }

    /// Get a stored parameter value.
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.param_values.get(key)
    }

    /// Overwrite a stored parameter value (editor-side mutation).
    pub fn set_param(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.param_values.insert(key.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_workflow_node() {
        let node: StepInstance = serde_json::from_value(json!({
            "id": "n1",
            "type": "WAIT",
            "params": {"seconds": 1},
            "position": {"x": 10.0, "y": 20.0}
        }))
        .unwrap();
        assert_eq!(node.type_id, "WAIT");
        assert_eq!(node.param("seconds"), Some(&json!(1)));
        assert_eq!(node.position, Some(Position::new(10.0, 20.0)));
    }

    #[test]
    fn test_deserialize_param_values_alias() {
        let node: StepInstance = serde_json::from_value(json!({
            "id": "n2",
            "type": "BROWSER_CLOSE",
            "paramValues": {"browserId": "S1"}
        }))
        .unwrap();
        assert_eq!(node.param("browserId"), Some(&json!("S1")));
        assert!(node.position.is_none());
    }

    #[test]
    fn test_missing_params_default_empty() {
        let node: StepInstance =
            serde_json::from_value(json!({"id": "n3", "type": "BROWSER_CLOSE"})).unwrap();
        assert!(node.param_values.is_empty());
    }

    #[test]
    fn test_set_param() {
        let mut node: StepInstance =
            serde_json::from_value(json!({"id": "n4", "type": "WAIT"})).unwrap();
        node.set_param("seconds", json!(3));
        assert_eq!(node.param("seconds"), Some(&json!(3)));
    }
}
