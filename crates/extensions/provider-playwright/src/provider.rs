//! Capability provider backed by the Playwright bridge.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use autorpa_protocols::{
    BoundingBox, BrowserHandle, CapabilityProvider, ClickOptions, ContextHandle, ContextOptions,
    ElementHandle, EngineKind, GotoOptions, LaunchOptions, PageClosedCallback, PageHandle,
    ProviderError,
};

use crate::bridge::{BridgeEvent, PlaywrightBridge, PlaywrightBridgeConfig};
use crate::error::{PlaywrightError, RemoteErrorKind};
use crate::external;

type Listeners = Arc<Mutex<HashMap<PageHandle, Vec<PageClosedCallback>>>>;

/// Drives real browsers through a Node.js Playwright process.
///
/// Nothing is spawned until the first browser operation.
pub struct PlaywrightProvider {
    bridge: PlaywrightBridge,
    listeners: Listeners,
}

impl PlaywrightProvider {
    pub fn new(config: PlaywrightBridgeConfig) -> Self {
        let listeners: Listeners = Arc::new(Mutex::new(HashMap::new()));
        let bridge = PlaywrightBridge::new(config)
            .with_event_handler(Arc::new(page_closed_handler(listeners.clone())));
        Self { bridge, listeners }
    }

    pub fn bridge(&self) -> &PlaywrightBridge {
        &self.bridge
    }

    /// Stop the bridge process and every browser it owns.
    pub async fn shutdown(&self) {
        self.listeners.lock().clear();
        self.bridge.stop().await;
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ProviderError> {
        let value = self.bridge.call(method, params).await?;
        decode(method, value)
    }

    async fn call_timed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
        timeout_ms: u64,
    ) -> Result<T, ProviderError> {
        let value = self.bridge.call_timed(method, params, timeout_ms).await?;
        decode(method, value)
    }
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, ProviderError> {
    serde_json::from_value(value)
        .map_err(|e| ProviderError::Bridge(format!("unexpected {} reply: {}", method, e)))
}

/// Fire and forget the callbacks registered for a page that closed.
fn page_closed_handler(listeners: Listeners) -> impl Fn(BridgeEvent) + Send + Sync {
    move |event| match event {
        BridgeEvent::PageClosed { page_id } => {
            let page = PageHandle::new(page_id);
            let callbacks = listeners.lock().remove(&page).unwrap_or_default();
            debug!("Page {} closed ({} listeners)", page, callbacks.len());
            for callback in callbacks {
                callback(page.clone());
            }
        }
    }
}

#[async_trait]
impl CapabilityProvider for PlaywrightProvider {
    fn name(&self) -> &str {
        "playwright"
    }

    async fn launch(
        &self,
        engine: EngineKind,
        options: &LaunchOptions,
    ) -> Result<BrowserHandle, ProviderError> {
        let params = json!({
            "engine": engine.as_str(),
            "headless": options.headless,
            "args": options.args,
        });
        match self.bridge.call("launch", params).await {
            Ok(value) => decode("launch", value),
            Err(PlaywrightError::Remote {
                kind: RemoteErrorKind::Launch,
                message,
            }) => Err(ProviderError::LaunchFailed(message)),
            Err(e) => Err(ProviderError::LaunchFailed(e.to_string())),
        }
    }

    async fn new_context(
        &self,
        browser: &BrowserHandle,
        options: &ContextOptions,
    ) -> Result<ContextHandle, ProviderError> {
        self.call(
            "newContext",
            json!({
                "browserId": browser,
                "viewport": options.viewport,
                "isolated": options.isolated,
            }),
        )
        .await
    }

    async fn new_page(&self, context: &ContextHandle) -> Result<PageHandle, ProviderError> {
        self.call("newPage", json!({ "contextId": context })).await
    }

    async fn list_pages(&self, context: &ContextHandle) -> Result<Vec<PageHandle>, ProviderError> {
        self.call("listPages", json!({ "contextId": context })).await
    }

    async fn goto(
        &self,
        page: &PageHandle,
        url: &str,
        options: &GotoOptions,
    ) -> Result<(), ProviderError> {
        let params = json!({
            "pageId": page,
            "url": url,
            "waitUntil": options.wait_until.as_str(),
            "timeout": options.timeout_ms,
        });
        self.call_timed::<Value>("goto", params, options.timeout_ms)
            .await
            .map(|_| ())
            .map_err(as_navigation_error)
    }

    async fn reload(&self, page: &PageHandle, options: &GotoOptions) -> Result<(), ProviderError> {
        let params = json!({
            "pageId": page,
            "waitUntil": options.wait_until.as_str(),
            "timeout": options.timeout_ms,
        });
        self.call_timed::<Value>("reload", params, options.timeout_ms)
            .await
            .map(|_| ())
            .map_err(as_navigation_error)
    }

    async fn wait_for_selector(
        &self,
        page: &PageHandle,
        selector: &str,
        timeout_ms: u64,
    ) -> Result<(), ProviderError> {
        let params = json!({ "pageId": page, "selector": selector, "timeout": timeout_ms });
        match self.call_timed::<Value>("waitForSelector", params, timeout_ms).await {
            Ok(_) => Ok(()),
            Err(ProviderError::Timeout(_)) => Err(ProviderError::SelectorTimeout {
                selector: selector.to_string(),
                timeout_ms,
            }),
            Err(e) => Err(e),
        }
    }

    async fn click(
        &self,
        page: &PageHandle,
        selector: &str,
        options: &ClickOptions,
    ) -> Result<(), ProviderError> {
        let params = json!({
            "pageId": page,
            "selector": selector,
            "clickCount": options.click_count,
            "waitForNavigation": options.wait_for_navigation,
            "timeout": options.timeout_ms,
        });
        self.call_timed::<Value>("click", params, options.timeout_ms)
            .await
            .map(|_| ())
    }

    async fn fill(
        &self,
        page: &PageHandle,
        selector: &str,
        text: &str,
    ) -> Result<(), ProviderError> {
        self.call::<Value>(
            "fill",
            json!({ "pageId": page, "selector": selector, "text": text }),
        )
        .await
        .map(|_| ())
    }

    async fn type_text(
        &self,
        page: &PageHandle,
        selector: &str,
        text: &str,
    ) -> Result<(), ProviderError> {
        self.call::<Value>(
            "type",
            json!({ "pageId": page, "selector": selector, "text": text }),
        )
        .await
        .map(|_| ())
    }

    async fn text_content(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<Option<String>, ProviderError> {
        self.call("textContent", json!({ "pageId": page, "selector": selector }))
            .await
    }

    async fn inner_html(&self, page: &PageHandle, selector: &str) -> Result<String, ProviderError> {
        self.call("innerHTML", json!({ "pageId": page, "selector": selector }))
            .await
    }

    async fn get_attribute(
        &self,
        page: &PageHandle,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, ProviderError> {
        self.call(
            "getAttribute",
            json!({ "pageId": page, "selector": selector, "name": name }),
        )
        .await
    }

    async fn input_value(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<String, ProviderError> {
        self.call("inputValue", json!({ "pageId": page, "selector": selector }))
            .await
    }

    async fn query_all(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, ProviderError> {
        self.call("queryAll", json!({ "pageId": page, "selector": selector }))
            .await
    }

    async fn element_tag_name(&self, element: &ElementHandle) -> Result<String, ProviderError> {
        self.call("elementTagName", json!({ "elementId": element }))
            .await
    }

    async fn element_text_content(
        &self,
        element: &ElementHandle,
    ) -> Result<Option<String>, ProviderError> {
        self.call("elementTextContent", json!({ "elementId": element }))
            .await
    }

    async fn element_attributes(
        &self,
        element: &ElementHandle,
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        self.call("elementAttributes", json!({ "elementId": element }))
            .await
    }

    async fn element_bounding_box(
        &self,
        element: &ElementHandle,
    ) -> Result<Option<BoundingBox>, ProviderError> {
        self.call("elementBoundingBox", json!({ "elementId": element }))
            .await
    }

    async fn wait(&self, duration: Duration) -> Result<(), ProviderError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn on_page_closed(
        &self,
        page: &PageHandle,
        callback: PageClosedCallback,
    ) -> Result<(), ProviderError> {
        self.listeners
            .lock()
            .entry(page.clone())
            .or_default()
            .push(callback);
        Ok(())
    }

    async fn close(&self, browser: &BrowserHandle) -> Result<(), ProviderError> {
        self.call::<Value>("close", json!({ "browserId": browser }))
            .await
            .map(|_| ())
    }

    async fn open_external(&self, url: &str) -> Result<(), ProviderError> {
        external::open_with_default_handler(url).await
    }
}

fn as_navigation_error(e: ProviderError) -> ProviderError {
    match e {
        ProviderError::NavigationFailed(_) | ProviderError::PageNotFound(_) => e,
        other => ProviderError::NavigationFailed(other.to_string()),
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
