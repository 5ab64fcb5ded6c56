//! Node instance factory.
//!
//! Builds parameter-bound step instances and editor node records from a
//! registered type. Both paths use the same merge: schema defaults, then
//! caller overrides, later keys win. The merged map is validated in full.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use autorpa_protocols::{
    ParamDescriptor, ParamValues, Position, StepCategory, StepError, StepInstance,
    StepTypeDefinition,
};

use crate::registry::StepTypeRegistry;

/// Editor node type understood by the graph canvas.
pub const EDITOR_NODE_TYPE: &str = "custom-node";

/// Creates step instances from registered types.
#[derive(Clone)]
pub struct NodeFactory {
    registry: Arc<StepTypeRegistry>,
}

impl NodeFactory {
    pub fn new(registry: Arc<StepTypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<StepTypeRegistry> {
        &self.registry
    }

    /// Create a validated step instance.
    ///
    /// Fails with [`StepError::UnknownType`] for an unregistered type and
    /// [`StepError::Validation`] when the merged parameters are rejected.
    pub fn create(
        &self,
        type_id: &str,
        overrides: ParamValues,
        position: Option<Position>,
    ) -> Result<StepInstance, StepError> {
        let definition = self.registry.get(type_id)?;
        let param_values = merge_validated(&definition, overrides)?;

        Ok(StepInstance {
            id: generate_id(),
            type_id: definition.type_id.clone(),
            param_values,
            position,
        })
    }

    /// Create a presentation record for the graph editor.
    pub fn create_editor_node(
        &self,
        type_id: &str,
        options: EditorNodeOptions,
    ) -> Result<EditorNode, StepError> {
        let definition = self.registry.get(type_id)?;
        let param_values = merge_validated(&definition, options.initial_params)?;
        let id = options.id.unwrap_or_else(generate_id);
        let position = options.position.unwrap_or_default();

        Ok(EditorNode {
            id: id.clone(),
            node_type: EDITOR_NODE_TYPE.to_string(),
            data: EditorNodeData {
                id,
                type_id: definition.type_id.clone(),
                name: definition.display_name.clone(),
                icon: definition.icon_ref.clone(),
                category: definition.category,
                params: definition
                    .parameter_schema
                    .iter()
                    .map(EditorParam::from)
                    .collect(),
                param_values,
                selected: false,
                created_at: Utc::now(),
            },
            position,
            selected: false,
        })
    }
}

fn merge_validated(
    definition: &StepTypeDefinition,
    overrides: ParamValues,
) -> Result<ParamValues, StepError> {
    let mut params = definition.default_params();
    params.extend(overrides);
    definition
        .validate(&params)
        .into_result()
        .map_err(|reason| StepError::validation(&definition.type_id, reason))?;
    Ok(params)
}

fn generate_id() -> String {
    format!("step_{}", Uuid::new_v4().simple())
}

/// Options for [`NodeFactory::create_editor_node`].
#[derive(Debug, Clone, Default)]
pub struct EditorNodeOptions {
    /// Reuse an existing id instead of generating one.
    pub id: Option<String>,
    pub initial_params: ParamValues,
    pub position: Option<Position>,
}

/// Graph editor node wrapping a step instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub data: EditorNodeData,
    pub position: Position,
    pub selected: bool,
}

impl EditorNode {
    /// The executable part of this node.
    pub fn to_instance(&self) -> StepInstance {
        StepInstance {
            id: self.id.clone(),
            type_id: self.data.type_id.clone(),
            param_values: self.data.param_values.clone(),
            position: Some(self.position),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorNodeData {
    pub id: String,
    #[serde(rename = "type")]
    pub type_id: String,
    pub name: String,
    pub icon: String,
    pub category: StepCategory,
    pub params: Vec<EditorParam>,
    pub param_values: ParamValues,
    pub selected: bool,
    pub created_at: DateTime<Utc>,
}

/// Parameter descriptor with the legacy `name` alias of its label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorParam {
    #[serde(flatten)]
    pub descriptor: ParamDescriptor,
    pub name: String,
}

impl From<&ParamDescriptor> for EditorParam {
    fn from(descriptor: &ParamDescriptor) -> Self {
        Self {
            name: descriptor.label.clone(),
            descriptor: descriptor.clone(),
        }
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
