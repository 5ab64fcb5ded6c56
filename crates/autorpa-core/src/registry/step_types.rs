//! Step type registry.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use autorpa_protocols::{
    ParamValues, RegistryError, StepCategory, StepTypeDefinition, ValidationResult,
};

use super::base::{BaseRegistry, Registerable};
use crate::catalog;

impl Registerable for StepTypeDefinition {
    fn registry_id(&self) -> &str {
        &self.type_id
    }
}

/// Authoritative catalog of step types.
///
/// Constructed explicitly and passed to whoever needs it. Definitions are
/// immutable once registered.
pub struct StepTypeRegistry {
    inner: BaseRegistry<StepTypeDefinition>,
}

impl StepTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: BaseRegistry::new(),
        }
    }

    /// Create a registry populated with the built-in catalog.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let registry = Self::new();
        for definition in catalog::builtin_definitions() {
            registry.register(definition)?;
        }
        info!(
            "Step type registry initialized with {} types: {:?}",
            registry.len(),
            registry.category_stats()
        );
        Ok(registry)
    }

    /// Register a definition.
    ///
    /// Rejects duplicate type ids, duplicate parameter keys, and schemas whose
    /// defaults do not pass the definition's own validation.
    pub fn register(&self, definition: StepTypeDefinition) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for param in &definition.parameter_schema {
            if !seen.insert(param.key.as_str()) {
                return Err(RegistryError::InvalidDefinition {
                    type_id: definition.type_id.clone(),
                    reason: format!("duplicate parameter key '{}'", param.key),
                });
            }
        }

        if let Err(reason) = definition.validate(&definition.default_params()).into_result() {
            return Err(RegistryError::InvalidDefinition {
                type_id: definition.type_id.clone(),
                reason: format!("default parameters are invalid: {reason}"),
            });
        }

        debug!("Registering step type: {}", definition.type_id);
        self.inner.register(Arc::new(definition))
    }

    /// Get a definition by type id.
    pub fn get(&self, type_id: &str) -> Result<Arc<StepTypeDefinition>, RegistryError> {
        self.inner
            .get(type_id)
            .ok_or_else(|| RegistryError::UnknownType(type_id.to_string()))
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.inner.contains(type_id)
    }

    /// All definitions in registration order.
    pub fn list(&self) -> Vec<Arc<StepTypeDefinition>> {
        self.inner.values()
    }

    /// Definitions of one category, in registration order.
    pub fn list_by_category(&self, category: StepCategory) -> Vec<Arc<StepTypeDefinition>> {
        self.inner
            .values()
            .into_iter()
            .filter(|d| d.category == category)
            .collect()
    }

    /// Schema defaults for a type.
    pub fn default_params(&self, type_id: &str) -> Result<ParamValues, RegistryError> {
        Ok(self.get(type_id)?.default_params())
    }

    /// Validate parameter values against a type's schema.
    pub fn validate(
        &self,
        type_id: &str,
        params: &ParamValues,
    ) -> Result<ValidationResult, RegistryError> {
        Ok(self.get(type_id)?.validate(params))
    }

    /// Number of registered types per category, in category order.
    pub fn category_stats(&self) -> IndexMap<StepCategory, usize> {
        let definitions = self.inner.values();
        StepCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let count = definitions.iter().filter(|d| d.category == category).count();
                (count > 0).then_some((category, count))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for StepTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "step_types_tests.rs"]
mod tests;
