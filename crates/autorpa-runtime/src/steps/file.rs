//! File output steps.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use autorpa_protocols::{ExecutionResult, StepError};

use super::{Executable, require_non_empty};
use crate::context::ExecutionContext;
use crate::variables::display;

/// On-disk representation of saved data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Txt,
    Json,
    Csv,
}

impl FileFormat {
    /// Render `data` in this format.
    pub fn render(&self, data: &Value) -> Result<String, serde_json::Error> {
        match self {
            FileFormat::Txt => Ok(display(data)),
            FileFormat::Json => serde_json::to_string_pretty(&structured(data)),
            FileFormat::Csv => Ok(to_csv(&structured(data)).unwrap_or_else(|| display(data))),
        }
    }
}

/// Write data to a file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFile {
    #[serde(default)]
    pub data: Value,
    pub file_path: String,
    #[serde(default)]
    pub format: FileFormat,
}

impl SaveFile {
    /// Expand a leading `~` against `home` and make the path absolute.
    pub fn resolve_path(&self, home: Option<&PathBuf>) -> io::Result<PathBuf> {
        let expanded = shellexpand::tilde_with_context(self.file_path.trim(), || home.map(|h| h.to_string_lossy()));
        std::path::absolute(Path::new(expanded.as_ref()))
    }
}

#[async_trait]
impl Executable for SaveFile {
    fn check(&self) -> Result<(), String> {
        require_non_empty("filePath", &self.file_path)
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        let path = self.resolve_path(ctx.home_dir())?;
        let content = self.format.render(&self.data).map_err(io::Error::from)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content.as_bytes()).await?;

        ctx.log()
            .info(&format!("Saved {} bytes to {}", content.len(), path.display()));
        Ok(ExecutionResult::success_with(json!({
            "filePath": path,
            "bytes": content.len(),
        }))
        .with_file(path))
    }
}

/// Parse strings holding JSON so they can be re-rendered as structure.
fn structured(data: &Value) -> Value {
    match data {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| data.clone()),
        other => other.clone(),
    }
}

/// CSV for an array of objects: a header row of every key in first-seen
/// order, then one row per object.
fn to_csv(data: &Value) -> Option<String> {
    let rows = data.as_array()?;
    if rows.is_empty() {
        return None;
    }
    let objects = rows
        .iter()
        .map(Value::as_object)
        .collect::<Option<Vec<_>>>()?;

    let mut headers: Vec<&str> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    let mut out = headers
        .iter()
        .map(|h| escape_field(h))
        .collect::<Vec<_>>()
        .join(",");
    for object in &objects {
        out.push('\n');
        let line = headers
            .iter()
            .map(|h| escape_field(&object.get(*h).map(display).unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
    }
    out.push('\n');
    Some(out)
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
