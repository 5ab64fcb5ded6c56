//! Run variables and `${name}` parameter references.

use serde_json::{Map, Value};

use autorpa_protocols::ParamValues;

/// Values stored by steps during one run, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    values: Map<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Resolve every `${name}` reference in a parameter map.
    pub fn resolve_params(&self, params: &ParamValues) -> ParamValues {
        params
            .iter()
            .map(|(key, value)| (key.clone(), self.resolve(value)))
            .collect()
    }

    /// Resolve references inside one value.
    ///
    /// A string that is exactly `${name}` becomes the variable's value with its
    /// JSON type intact. References embedded in longer strings are replaced by
    /// their text form. Unknown names are left untouched.
    pub fn resolve(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => self.resolve_str(s),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.resolve(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn resolve_str(&self, s: &str) -> Value {
        if let Some(name) = whole_reference(s) {
            if let Some(value) = self.values.get(name) {
                return value.clone();
            }
        }

        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    match self.values.get(name).filter(|_| is_name(name)) {
                        Some(value) => out.push_str(&display(value)),
                        None => out.push_str(&rest[start..start + 2 + end + 1]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        Value::String(out)
    }
}

impl From<Map<String, Value>> for Variables {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// Text form of a value for string interpolation.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn whole_reference(s: &str) -> Option<&str> {
    let name = s.strip_prefix("${")?.strip_suffix('}')?;
    is_name(name).then_some(name)
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
