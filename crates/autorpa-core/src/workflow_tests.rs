use super::*;
use serde_json::json;

fn workflow(nodes: &[&str], edges: &[(&str, &str)]) -> Workflow {
    let value = json!({
        "nodes": nodes.iter().map(|id| json!({"id": id, "type": "WAIT"})).collect::<Vec<_>>(),
        "edges": edges.iter().map(|(s, t)| json!({"source": s, "target": t})).collect::<Vec<_>>(),
    });
    serde_json::from_value(value).unwrap()
}

fn ids(order: Vec<&StepInstance>) -> Vec<&str> {
    order.into_iter().map(|n| n.id.as_str()).collect()
}

#[test]
fn test_no_edges_uses_declaration_order() {
    let wf = workflow(&["a", "b", "c"], &[]);
    assert_eq!(ids(wf.execution_order().unwrap()), vec!["a", "b", "c"]);
}

#[test]
fn test_edges_define_order() {
    let wf = workflow(&["close", "open", "extract"], &[("open", "extract"), ("extract", "close")]);
    assert_eq!(
        ids(wf.execution_order().unwrap()),
        vec!["open", "extract", "close"]
    );
}

#[test]
fn test_disconnected_chains_interleave_by_declaration() {
    let wf = workflow(&["x", "a", "b", "y"], &[("a", "b"), ("x", "y")]);
    assert_eq!(ids(wf.execution_order().unwrap()), vec!["x", "a", "b", "y"]);
}

#[test]
fn test_cycle_rejected() {
    let wf = workflow(&["a", "b"], &[("a", "b"), ("b", "a")]);
    assert!(matches!(wf.execution_order(), Err(WorkflowError::Cycle(_))));
}

#[test]
fn test_branching_rejected() {
    let wf = workflow(&["a", "b", "c"], &[("a", "b"), ("a", "c")]);
    assert!(matches!(
        wf.execution_order(),
        Err(WorkflowError::Branching(ref id)) if id == "a"
    ));

    let wf = workflow(&["a", "b", "c"], &[("a", "c"), ("b", "c")]);
    assert!(matches!(
        wf.execution_order(),
        Err(WorkflowError::Branching(ref id)) if id == "c"
    ));
}

#[test]
fn test_unknown_node_rejected() {
    let wf = workflow(&["a"], &[("a", "ghost")]);
    assert!(matches!(
        wf.execution_order(),
        Err(WorkflowError::UnknownNode(ref id)) if id == "ghost"
    ));
}

#[test]
fn test_duplicate_node_rejected() {
    let wf = workflow(&["a", "a"], &[]);
    assert!(matches!(
        wf.execution_order(),
        Err(WorkflowError::DuplicateNode(_))
    ));
}

#[test]
fn test_parse_editor_document() {
    let wf = Workflow::from_json(
        r#"{
            "name": "demo",
            "nodes": [
                {"id": "n1", "type": "BROWSER_OPEN", "params": {"url": "https://x.test"}, "position": {"x": 0, "y": 0}},
                {"id": "n2", "type": "BROWSER_CLOSE"}
            ],
            "edges": [{"id": "e1", "source": "n1", "target": "n2"}]
        }"#,
    )
    .unwrap();
    assert_eq!(wf.name.as_deref(), Some("demo"));
    assert_eq!(wf.node("n1").unwrap().param("url"), Some(&json!("https://x.test")));
    assert_eq!(wf.edges[0].id.as_deref(), Some("e1"));
}

#[test]
fn test_parse_error() {
    assert!(matches!(
        Workflow::from_json("{not json"),
        Err(WorkflowError::Parse(_))
    ));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wf.json");
    std::fs::write(&path, r#"{"nodes": [{"id": "w", "type": "WAIT"}]}"#).unwrap();
    let wf = Workflow::load(&path).unwrap();
    assert_eq!(wf.nodes.len(), 1);
    assert!(matches!(
        Workflow::load(&dir.path().join("missing.json")),
        Err(WorkflowError::Io(_))
    ));
}
