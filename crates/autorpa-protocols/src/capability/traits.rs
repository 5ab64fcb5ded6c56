//! Capability provider trait definition.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{
    BoundingBox, BrowserHandle, ClickOptions, ContextHandle, ContextOptions, ElementHandle,
    EngineKind, GotoOptions, LaunchOptions, PageHandle,
};
use crate::error::ProviderError;

/// Callback invoked when a page closes.
pub type PageClosedCallback = Arc<dyn Fn(PageHandle) + Send + Sync>;

/// Session-oriented browser automation backend.
///
/// Every method is a suspension point. Implementations must be safe to share
/// across tasks; callers serialize operations on one session themselves.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Launch a browser engine.
    async fn launch(
        &self,
        engine: EngineKind,
        options: &LaunchOptions,
    ) -> Result<BrowserHandle, ProviderError>;

    /// Create a browsing context inside a launched browser.
    async fn new_context(
        &self,
        browser: &BrowserHandle,
        options: &ContextOptions,
    ) -> Result<ContextHandle, ProviderError>;

    /// Open a new page in a context.
    async fn new_page(&self, context: &ContextHandle) -> Result<PageHandle, ProviderError>;

    /// List the pages still open in a context.
    async fn list_pages(&self, context: &ContextHandle) -> Result<Vec<PageHandle>, ProviderError>;

    /// Navigate a page.
    async fn goto(
        &self,
        page: &PageHandle,
        url: &str,
        options: &GotoOptions,
    ) -> Result<(), ProviderError>;

    /// Reload the current document.
    async fn reload(&self, page: &PageHandle, options: &GotoOptions) -> Result<(), ProviderError>;

    /// Wait until `selector` matches an element, or fail after `timeout_ms`.
    async fn wait_for_selector(
        &self,
        page: &PageHandle,
        selector: &str,
        timeout_ms: u64,
    ) -> Result<(), ProviderError>;

    /// Click the first element matching `selector`.
    async fn click(
        &self,
        page: &PageHandle,
        selector: &str,
        options: &ClickOptions,
    ) -> Result<(), ProviderError>;

    /// Replace the content of an input.
    async fn fill(&self, page: &PageHandle, selector: &str, text: &str)
        -> Result<(), ProviderError>;

    /// Type text key by key after any existing content.
    async fn type_text(
        &self,
        page: &PageHandle,
        selector: &str,
        text: &str,
    ) -> Result<(), ProviderError>;

    async fn text_content(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<Option<String>, ProviderError>;

    async fn inner_html(&self, page: &PageHandle, selector: &str) -> Result<String, ProviderError>;

    async fn get_attribute(
        &self,
        page: &PageHandle,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, ProviderError>;

    async fn input_value(&self, page: &PageHandle, selector: &str)
        -> Result<String, ProviderError>;

    /// All elements matching `selector`, in document order.
    async fn query_all(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, ProviderError>;

    async fn element_tag_name(&self, element: &ElementHandle) -> Result<String, ProviderError>;

    async fn element_text_content(
        &self,
        element: &ElementHandle,
    ) -> Result<Option<String>, ProviderError>;

    async fn element_attributes(
        &self,
        element: &ElementHandle,
    ) -> Result<BTreeMap<String, String>, ProviderError>;

    async fn element_bounding_box(
        &self,
        element: &ElementHandle,
    ) -> Result<Option<BoundingBox>, ProviderError>;

    /// Suspend for `duration`.
    async fn wait(&self, duration: Duration) -> Result<(), ProviderError>;

    /// Register a callback fired once when `page` closes.
    async fn on_page_closed(
        &self,
        page: &PageHandle,
        callback: PageClosedCallback,
    ) -> Result<(), ProviderError>;

    /// Close a browser and everything it owns.
    async fn close(&self, browser: &BrowserHandle) -> Result<(), ProviderError>;

    /// Open `url` with the operating system's default handler.
    async fn open_external(&self, url: &str) -> Result<(), ProviderError>;
}
