//! Executable step variants.
//!
//! Each runnable step type has its own parameter struct, parsed from the
//! step's merged parameter map. [`Step`] is the tagged union the executor
//! dispatches on.

mod browser;
mod data;
mod file;
mod interaction;
mod logic;

pub use browser::{BrowserClose, BrowserNavigate, BrowserOpen, BrowserRefresh};
pub use data::{ExtractData, GetPageElements};
pub use file::{FileFormat, SaveFile};
pub use interaction::{ClickElement, InputText};
pub use logic::Wait;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use autorpa_protocols::{ExecutionResult, ParamValues, StepError, StepTypeDefinition};

use crate::context::ExecutionContext;

/// A step that can run against a capability provider.
#[async_trait]
pub trait Executable: Send + Sync {
    /// Checks the parameter schema cannot express, such as a selector that
    /// is present but blank. Runs before any provider call.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError>;
}

/// One step with typed parameters.
#[derive(Debug, Clone)]
pub enum Step {
    BrowserOpen(BrowserOpen),
    BrowserClose(BrowserClose),
    BrowserRefresh(BrowserRefresh),
    BrowserNavigate(BrowserNavigate),
    ClickElement(ClickElement),
    InputText(InputText),
    ExtractData(ExtractData),
    GetPageElements(GetPageElements),
    Wait(Wait),
    SaveFile(SaveFile),
    /// A catalogued type with no runtime behavior.
    Declared(String),
}

impl Step {
    /// Build the typed step for a definition.
    ///
    /// Missing or null values take the schema default. Fails with
    /// [`StepError::Validation`] when a value has the wrong shape or a
    /// pre-run check rejects it.
    pub fn from_params(
        definition: &StepTypeDefinition,
        params: &ParamValues,
    ) -> Result<Self, StepError> {
        let type_id = definition.type_id.as_str();
        let mut values = definition.default_params();
        for (key, value) in params {
            if !value.is_null() {
                values.insert(key.clone(), value.clone());
            }
        }

        let step = match type_id {
            "BROWSER_OPEN" => Step::BrowserOpen(parse(type_id, values)?),
            "BROWSER_CLOSE" => Step::BrowserClose(parse(type_id, values)?),
            "BROWSER_REFRESH" => Step::BrowserRefresh(parse(type_id, values)?),
            "BROWSER_NAVIGATE" => Step::BrowserNavigate(parse(type_id, values)?),
            "CLICK_ELEMENT" => Step::ClickElement(parse(type_id, values)?),
            "INPUT_TEXT" => Step::InputText(parse(type_id, values)?),
            "EXTRACT_DATA" => Step::ExtractData(parse(type_id, values)?),
            "GET_PAGE_ELEMENTS" => Step::GetPageElements(parse(type_id, values)?),
            "WAIT" => Step::Wait(parse(type_id, values)?),
            "SAVE_FILE" => Step::SaveFile(parse(type_id, values)?),
            _ => Step::Declared(type_id.to_string()),
        };

        step.check()
            .map_err(|reason| StepError::validation(type_id, reason))?;
        Ok(step)
    }

    pub fn type_id(&self) -> &str {
        match self {
            Step::BrowserOpen(_) => "BROWSER_OPEN",
            Step::BrowserClose(_) => "BROWSER_CLOSE",
            Step::BrowserRefresh(_) => "BROWSER_REFRESH",
            Step::BrowserNavigate(_) => "BROWSER_NAVIGATE",
            Step::ClickElement(_) => "CLICK_ELEMENT",
            Step::InputText(_) => "INPUT_TEXT",
            Step::ExtractData(_) => "EXTRACT_DATA",
            Step::GetPageElements(_) => "GET_PAGE_ELEMENTS",
            Step::Wait(_) => "WAIT",
            Step::SaveFile(_) => "SAVE_FILE",
            Step::Declared(type_id) => type_id,
        }
    }

    pub fn is_executable(&self) -> bool {
        !matches!(self, Step::Declared(_))
    }

    fn as_executable(&self) -> Option<&dyn Executable> {
        let step: &dyn Executable = match self {
            Step::BrowserOpen(s) => s,
            Step::BrowserClose(s) => s,
            Step::BrowserRefresh(s) => s,
            Step::BrowserNavigate(s) => s,
            Step::ClickElement(s) => s,
            Step::InputText(s) => s,
            Step::ExtractData(s) => s,
            Step::GetPageElements(s) => s,
            Step::Wait(s) => s,
            Step::SaveFile(s) => s,
            Step::Declared(_) => return None,
        };
        Some(step)
    }
}

#[async_trait]
impl Executable for Step {
    fn check(&self) -> Result<(), String> {
        self.as_executable().map_or(Ok(()), |s| s.check())
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        match self.as_executable() {
            Some(step) => step.run(ctx).await,
            None => Err(StepError::NotExecutable(self.type_id().to_string())),
        }
    }
}

fn parse<T: DeserializeOwned>(type_id: &str, values: ParamValues) -> Result<T, StepError> {
    serde_json::from_value(Value::Object(values))
        .map_err(|e| StepError::validation(type_id, e.to_string()))
}

pub(crate) fn require_non_empty(key: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("'{}' must not be empty", key))
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
