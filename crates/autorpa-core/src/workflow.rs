//! Workflow documents and execution order.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use autorpa_protocols::StepInstance;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Edge references unknown node: {0}")]
    UnknownNode(String),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Workflow graph contains a cycle through: {0}")]
    Cycle(String),

    #[error("Node {0} branches; only linear workflows can run")]
    Branching(String),

    #[error("Invalid workflow document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read workflow: {0}")]
    Io(#[from] std::io::Error),
}

/// Directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
}

/// A node graph as saved by the editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<StepInstance>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Workflow {
    pub fn from_json(json: &str) -> Result<Self, WorkflowError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, WorkflowError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn node(&self, id: &str) -> Option<&StepInstance> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes in the order they must run.
    ///
    /// Edges define the order; nodes that are not ordered relative to each
    /// other run in declaration order. Every node may have at most one
    /// incoming and one outgoing edge.
    pub fn execution_order(&self) -> Result<Vec<&StepInstance>, WorkflowError> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), i).is_some() {
                return Err(WorkflowError::DuplicateNode(node.id.clone()));
            }
        }

        let mut next: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut in_degree = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            let source = *index
                .get(edge.source.as_str())
                .ok_or_else(|| WorkflowError::UnknownNode(edge.source.clone()))?;
            let target = *index
                .get(edge.target.as_str())
                .ok_or_else(|| WorkflowError::UnknownNode(edge.target.clone()))?;

            if next[source].is_some() {
                return Err(WorkflowError::Branching(edge.source.clone()));
            }
            if in_degree[target] > 0 {
                return Err(WorkflowError::Branching(edge.target.clone()));
            }
            next[source] = Some(target);
            in_degree[target] += 1;
        }

        let mut ready: BTreeSet<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(i) = ready.pop_first() {
            order.push(&self.nodes[i]);
            if let Some(target) = next[i] {
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    ready.insert(target);
                }
            }
        }

        if order.len() < self.nodes.len() {
            let stuck = (0..self.nodes.len())
                .find(|&i| in_degree[i] > 0)
                .map(|i| self.nodes[i].id.clone())
                .unwrap_or_default();
            return Err(WorkflowError::Cycle(stuck));
        }
        Ok(order)
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
