use super::*;
use serde_json::json;

fn factory() -> NodeFactory {
    NodeFactory::new(Arc::new(StepTypeRegistry::with_builtins().unwrap()))
}

fn params(value: serde_json::Value) -> ParamValues {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_create_merges_defaults_and_overrides() {
    let step = factory()
        .create(
            "CLICK_ELEMENT",
            params(json!({"selector": "#submit", "retryCount": 4})),
            None,
        )
        .unwrap();

    assert_eq!(step.type_id, "CLICK_ELEMENT");
    assert_eq!(step.param_values["selector"], json!("#submit"));
    assert_eq!(step.param_values["retryCount"], json!(4));
    assert_eq!(step.param_values["retryDelay"], json!(1000));
    assert!(step.id.starts_with("step_"));
    assert!(step.position.is_none());
}

#[test]
fn test_create_generates_unique_ids() {
    let factory = factory();
    let a = factory.create("WAIT", ParamValues::new(), None).unwrap();
    let b = factory.create("WAIT", ParamValues::new(), None).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn test_create_keeps_position() {
    let step = factory()
        .create("WAIT", ParamValues::new(), Some(Position::new(5.0, 6.0)))
        .unwrap();
    assert_eq!(step.position, Some(Position::new(5.0, 6.0)));
}

#[test]
fn test_create_unknown_type() {
    let err = factory()
        .create("TELEPORT", ParamValues::new(), None)
        .unwrap_err();
    assert!(matches!(err, StepError::UnknownType(ref id) if id == "TELEPORT"));
    assert!(err.is_hard());
}

#[test]
fn test_create_validation_error() {
    let err = factory()
        .create("WAIT", params(json!({"seconds": -3})), None)
        .unwrap_err();
    match err {
        StepError::Validation { type_id, reason } => {
            assert_eq!(type_id, "WAIT");
            assert!(reason.contains("seconds"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_create_null_override_for_required_key_fails() {
    let err = factory()
        .create("BROWSER_OPEN", params(json!({"url": null})), None)
        .unwrap_err();
    assert!(matches!(err, StepError::Validation { .. }));
}

#[test]
fn test_editor_node_record() {
    let node = factory()
        .create_editor_node(
            "EXTRACT_DATA",
            EditorNodeOptions {
                id: Some("node-7".to_string()),
                initial_params: params(json!({"selector": "h1"})),
                position: Some(Position::new(100.0, 40.0)),
            },
        )
        .unwrap();

    assert_eq!(node.id, "node-7");
    assert_eq!(node.node_type, EDITOR_NODE_TYPE);
    assert_eq!(node.data.type_id, "EXTRACT_DATA");
    assert_eq!(node.data.category, StepCategory::Data);
    assert_eq!(node.data.icon, "DataAnalysis");
    assert!(!node.selected);
    assert!(!node.data.selected);
    assert_eq!(node.data.param_values["selector"], json!("h1"));
    assert_eq!(node.data.param_values["variableName"], json!("extractedData"));
    let selector = node
        .data
        .params
        .iter()
        .find(|p| p.descriptor.key == "selector")
        .unwrap();
    assert_eq!(selector.name, selector.descriptor.label);
}

#[test]
fn test_editor_node_serializes_label_alias() {
    let node = factory()
        .create_editor_node("WAIT", EditorNodeOptions::default())
        .unwrap();
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["type"], "custom-node");
    assert_eq!(json["data"]["type"], "WAIT");
    assert_eq!(json["data"]["params"][0]["key"], "seconds");
    assert_eq!(json["data"]["params"][0]["name"], json["data"]["params"][0]["label"]);
    assert!(json["data"]["createdAt"].is_string());
    assert_eq!(json["position"], json!({"x": 0.0, "y": 0.0}));
}

#[test]
fn test_editor_node_validates() {
    let err = factory()
        .create_editor_node(
            "WAIT",
            EditorNodeOptions {
                initial_params: params(json!({"seconds": "soon"})),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StepError::Validation { .. }));
}

#[test]
fn test_editor_node_to_instance() {
    let node = factory()
        .create_editor_node("WAIT", EditorNodeOptions::default())
        .unwrap();
    let instance = node.to_instance();
    assert_eq!(instance.id, node.id);
    assert_eq!(instance.type_id, "WAIT");
    assert_eq!(instance.param_values["seconds"], json!(2));
}
