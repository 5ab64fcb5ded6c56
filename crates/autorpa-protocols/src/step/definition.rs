//! Step type definitions and parameter schemas.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Concrete parameter values keyed by parameter key.
pub type ParamValues = serde_json::Map<String, Value>;

/// Type-specific validation hook. Must be pure.
pub type Validator = fn(&ParamValues) -> ValidationResult;

/// Display grouping for step types. Has no effect on behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepCategory {
    Browser,
    Interaction,
    Data,
    Logic,
    File,
}

impl StepCategory {
    pub const ALL: [StepCategory; 5] = [
        StepCategory::Browser,
        StepCategory::Interaction,
        StepCategory::Data,
        StepCategory::Logic,
        StepCategory::File,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepCategory::Browser => "browser",
            StepCategory::Interaction => "interaction",
            StepCategory::Data => "data",
            StepCategory::Logic => "logic",
            StepCategory::File => "file",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

/// Value kind accepted by a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    /// A string restricted to `options`.
    Enum,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Enum => "enum",
        }
    }
}

/// One entry of a step type's parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDescriptor {
    pub key: String,
    pub label: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    pub default_value: Value,
    /// Allowed values for `Enum`; display suggestions for `String`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParamDescriptor {
    fn new(key: &str, label: &str, kind: ParamKind, default_value: Value) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            default_value,
            options: Vec::new(),
            description: None,
        }
    }

    pub fn string(key: &str, label: &str, default_value: &str) -> Self {
        Self::new(key, label, ParamKind::String, Value::from(default_value))
    }

    pub fn number(key: &str, label: &str, default_value: impl Into<serde_json::Number>) -> Self {
        Self::new(key, label, ParamKind::Number, Value::Number(default_value.into()))
    }

    pub fn boolean(key: &str, label: &str, default_value: bool) -> Self {
        Self::new(key, label, ParamKind::Boolean, Value::Bool(default_value))
    }

    pub fn enumeration(key: &str, label: &str, options: &[&str], default_value: &str) -> Self {
        let mut descriptor = Self::new(key, label, ParamKind::Enum, Value::from(default_value));
        descriptor.options = options.iter().map(|o| o.to_string()).collect();
        descriptor
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_suggestions(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Check a concrete value against this descriptor's kind.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        let ok = match self.kind {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Enum => match value.as_str() {
                Some(s) => {
                    if !self.options.iter().any(|o| o == s) {
                        return Err(format!(
                            "'{}' must be one of [{}], got '{}'",
                            self.key,
                            self.options.join(", "),
                            s
                        ));
                    }
                    true
                }
                None => false,
            },
        };

        if ok {
            Ok(())
        } else {
            Err(format!(
                "'{}' must be a {}, got {}",
                self.key,
                self.kind.as_str(),
                value_kind(value)
            ))
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Outcome of validating a parameter map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.valid {
            Ok(())
        } else {
            Err(self.error.unwrap_or_else(|| "invalid parameters".to_string()))
        }
    }
}

/// Catalog entry for an executable step type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTypeDefinition {
    pub type_id: String,
    pub display_name: String,
    pub description: String,
    pub icon_ref: String,
    pub category: StepCategory,
    pub parameter_schema: Vec<ParamDescriptor>,
    #[serde(skip)]
    validator: Option<Validator>,
}

impl StepTypeDefinition {
    /// Create a definition with an empty schema.
    pub fn new(
        type_id: impl Into<String>,
        display_name: impl Into<String>,
        category: StepCategory,
    ) -> Self {
        Self {
            type_id: type_id.into(),
            display_name: display_name.into(),
            description: String::new(),
            icon_ref: String::new(),
            category,
            parameter_schema: Vec::new(),
            validator: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon_ref: impl Into<String>) -> Self {
        self.icon_ref = icon_ref.into();
        self
    }

    pub fn with_param(mut self, param: ParamDescriptor) -> Self {
        self.parameter_schema.push(param);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Look up a parameter descriptor by key.
    pub fn param(&self, key: &str) -> Option<&ParamDescriptor> {
        self.parameter_schema.iter().find(|p| p.key == key)
    }

    /// Default values derived from the schema.
    pub fn default_params(&self) -> ParamValues {
        self.parameter_schema
            .iter()
            .map(|p| (p.key.clone(), p.default_value.clone()))
            .collect()
    }

    /// Validate a parameter map against the schema, then the type-specific hook.
    ///
    /// Required keys must be present and non-null. Present values must match
    /// their declared kind. Keys outside the schema are ignored.
    pub fn validate(&self, params: &ParamValues) -> ValidationResult {
        for descriptor in &self.parameter_schema {
            match params.get(&descriptor.key) {
                None | Some(Value::Null) => {
                    if descriptor.required {
                        return ValidationResult::fail(format!(
                            "'{}' is required",
                            descriptor.key
                        ));
                    }
                }
                Some(value) => {
                    if let Err(e) = descriptor.check(value) {
                        return ValidationResult::fail(e);
                    }
                }
            }
        }

        match self.validator {
            Some(validator) => validator(params),
            None => ValidationResult::ok(),
        }
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
