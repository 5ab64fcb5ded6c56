//! Data extraction steps.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use autorpa_protocols::{
    CapabilityProvider, ElementHandle, ExecutionResult, ExtractKind, PageHandle, ProviderError,
    StepError,
};

use super::{Executable, require_non_empty};
use crate::context::ExecutionContext;

/// Read one value from the first element matching a selector.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractData {
    pub selector: String,
    pub extract_type: String,
    pub attribute_name: String,
    pub variable_name: String,
    pub timeout: u64,
    pub browser_id: String,
}

impl ExtractData {
    pub fn kind(&self) -> ExtractKind {
        ExtractKind::parse_lenient(&self.extract_type, &self.attribute_name)
    }

    async fn extract(
        &self,
        provider: &dyn CapabilityProvider,
        page: &PageHandle,
    ) -> Result<Value, ProviderError> {
        let value = match self.kind() {
            ExtractKind::Text => provider.text_content(page, &self.selector).await?.into(),
            ExtractKind::Html => provider.inner_html(page, &self.selector).await?.into(),
            ExtractKind::Attribute(name) => {
                provider.get_attribute(page, &self.selector, &name).await?.into()
            }
            ExtractKind::Value => provider.input_value(page, &self.selector).await?.into(),
        };
        Ok(value)
    }
}

#[async_trait]
impl Executable for ExtractData {
    fn check(&self) -> Result<(), String> {
        require_non_empty("selector", &self.selector)
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        let (session, _guard) = ctx.lock_session(&self.browser_id).await?;
        let page = session.current_page();
        let provider = ctx.provider().as_ref();

        let kind = self.kind();
        if kind.as_str() != self.extract_type {
            ctx.log().debug(&format!(
                "Unknown extract type '{}', extracting text",
                self.extract_type
            ));
        }

        provider
            .wait_for_selector(&page, &self.selector, self.timeout)
            .await?;
        let value = self.extract(provider, &page).await?;

        Ok(store_as(ExecutionResult::success_with(value), &self.variable_name))
    }
}

/// Collect details of every element matching a selector, in document order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPageElements {
    pub browser_id: String,
    pub selector: String,
    /// Capture attributes and geometry, not just tag and text.
    pub extract_details: bool,
    pub variable_name: String,
    pub timeout: u64,
}

impl GetPageElements {
    async fn describe(
        &self,
        provider: &dyn CapabilityProvider,
        index: usize,
        element: &ElementHandle,
    ) -> Result<Value, ProviderError> {
        let tag_name = provider.element_tag_name(element).await?;
        let text = provider.element_text_content(element).await?;
        let mut details = json!({
            "index": index,
            "tagName": tag_name.to_lowercase(),
            "textContent": text.map(|t| t.trim().to_string()),
        });

        if self.extract_details {
            let attributes = provider.element_attributes(element).await?;
            let bounding_box = provider.element_bounding_box(element).await?;
            details["attributes"] = json!(attributes);
            details["boundingBox"] = json!(bounding_box);
        }
        Ok(details)
    }
}

#[async_trait]
impl Executable for GetPageElements {
    fn check(&self) -> Result<(), String> {
        require_non_empty("selector", &self.selector)
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        let (session, _guard) = ctx.lock_session(&self.browser_id).await?;
        let page = session.current_page();
        let provider = ctx.provider().as_ref();

        provider
            .wait_for_selector(&page, &self.selector, self.timeout)
            .await?;
        let handles = provider.query_all(&page, &self.selector).await?;

        let mut elements = Vec::with_capacity(handles.len());
        for (index, handle) in handles.iter().enumerate() {
            match self.describe(provider, index, handle).await {
                Ok(details) => elements.push(details),
                Err(e) => ctx
                    .log()
                    .warn(&format!("Skipping element {} of '{}': {}", index, self.selector, e)),
            }
        }

        ctx.log().info(&format!(
            "Collected {}/{} elements matching '{}'",
            elements.len(),
            handles.len(),
            self.selector
        ));
        Ok(store_as(
            ExecutionResult::success_with(Value::Array(elements)),
            &self.variable_name,
        ))
    }
}

/// Mark a result's data for storage under `variable_name`, when one is set.
fn store_as(result: ExecutionResult, variable_name: &str) -> ExecutionResult {
    let name = variable_name.trim();
    if name.is_empty() {
        result
    } else {
        result.with_variable(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(kind: &str) -> ExtractData {
        ExtractData {
            selector: "h1".to_string(),
            extract_type: kind.to_string(),
            attribute_name: "href".to_string(),
            variable_name: "title".to_string(),
            timeout: 100,
            browser_id: String::new(),
        }
    }

    #[test]
    fn test_extract_kind_falls_back_to_text() {
        assert_eq!(extract("text").kind(), ExtractKind::Text);
        assert_eq!(
            extract("attribute").kind(),
            ExtractKind::Attribute("href".to_string())
        );
        assert_eq!(extract("outerHTML").kind(), ExtractKind::Text);
    }

    #[test]
    fn test_store_as() {
        let result = store_as(ExecutionResult::success(), " title ");
        assert_eq!(result.side_effects.variable.as_deref(), Some("title"));

        let result = store_as(ExecutionResult::success(), "");
        assert!(result.side_effects.variable.is_none());
    }
}
