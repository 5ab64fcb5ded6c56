//! Mock capability provider.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use autorpa_protocols::{
    BoundingBox, BrowserHandle, CapabilityProvider, ClickOptions, ContextHandle, ContextOptions,
    ElementHandle, EngineKind, GotoOptions, LaunchOptions, PageClosedCallback, PageHandle,
    ProviderError,
};

use crate::MockElement;
use crate::state::{BrowserEntry, ContextEntry, MockCall, PageEntry, State};

/// Deterministic provider with scripted responses.
///
/// Unless scripted otherwise every selector exists, text reads return
/// `"mocked {selector} text"` and waits sleep for real.
#[derive(Default)]
pub struct MockProvider {
    state: Mutex<State>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text returned for `selector`.
    pub fn with_text(mut self, selector: &str, text: &str) -> Self {
        let state = self.state.get_mut();
        state.script.texts.insert(selector.to_string(), text.to_string());
        self
    }

    /// Markup returned for `selector`.
    pub fn with_html(mut self, selector: &str, html: &str) -> Self {
        let state = self.state.get_mut();
        state.script.html.insert(selector.to_string(), html.to_string());
        self
    }

    pub fn with_attribute(mut self, selector: &str, name: &str, value: &str) -> Self {
        let state = self.state.get_mut();
        state
            .script
            .attributes
            .insert((selector.to_string(), name.to_string()), value.to_string());
        self
    }

    /// `selector` only appears on wait attempt number `attempt` (1-based).
    pub fn with_selector_available_after(mut self, selector: &str, attempt: u32) -> Self {
        let state = self.state.get_mut();
        state
            .script
            .available_after
            .insert(selector.to_string(), attempt);
        self
    }

    /// `selector` never appears.
    pub fn with_missing_selector(mut self, selector: &str) -> Self {
        self.state.get_mut().script.missing.insert(selector.to_string());
        self
    }

    /// Elements returned by `query_all(selector)`.
    pub fn with_elements(mut self, selector: &str, elements: Vec<MockElement>) -> Self {
        let state = self.state.get_mut();
        state.script.elements.insert(selector.to_string(), elements);
        self
    }

    /// Every launch fails with `message`.
    pub fn with_launch_failure(mut self, message: &str) -> Self {
        self.state.get_mut().script.launch_error = Some(message.to_string());
        self
    }

    /// Every navigation fails with `message`.
    pub fn with_navigation_failure(mut self, message: &str) -> Self {
        self.state.get_mut().script.navigation_error = Some(message.to_string());
        self
    }

    /// Every navigation takes `delay` before it settles.
    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.state.get_mut().script.navigation_delay = Some(delay);
        self
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    /// Number of wait attempts made for `selector`.
    pub fn wait_attempts(&self, selector: &str) -> u32 {
        self.state.lock().attempts.get(selector).copied().unwrap_or(0)
    }

    /// Number of browsers launched so far.
    pub fn launch_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MockCall::Launch { .. }))
            .count()
    }

    /// Options of the most recent launch.
    pub fn last_launch(&self) -> Option<LaunchOptions> {
        self.state.lock().last_launch.clone()
    }

    /// Number of browsers still open.
    pub fn open_browsers(&self) -> usize {
        self.state.lock().browsers.len()
    }

    /// Options a context was created with.
    pub fn context_options(&self, context: &ContextHandle) -> Option<ContextOptions> {
        self.state
            .lock()
            .contexts
            .get(context)
            .map(|c| c.options.clone())
    }

    /// URL a page was last navigated to.
    pub fn page_url(&self, page: &PageHandle) -> Option<String> {
        self.state.lock().pages.get(page).and_then(|p| p.url.clone())
    }

    /// Current value of an input after fill/type calls.
    pub fn input_value_of(&self, selector: &str) -> Option<String> {
        self.state.lock().values.get(selector).cloned()
    }

    /// Simulate the user closing a tab. Fires the page's close callbacks.
    pub fn close_page(&self, page: &PageHandle) {
        let callbacks = self.state.lock().remove_page(page);
        debug!("Mock page closed: {} ({} listeners)", page, callbacks.len());
        for callback in callbacks {
            callback(page.clone());
        }
    }

    fn record(&self, call: MockCall) {
        self.state.lock().calls.push(call);
    }

    fn ensure_page(&self, page: &PageHandle) -> Result<(), ProviderError> {
        if self.state.lock().pages.contains_key(page) {
            Ok(())
        } else {
            Err(ProviderError::PageNotFound(page.to_string()))
        }
    }

    fn element(&self, element: &ElementHandle) -> Result<MockElement, ProviderError> {
        let found = self.state.lock().elements.get(element).cloned();
        match found {
            Some(e) if e.detached => Err(ProviderError::ActionFailed(format!(
                "element {element} is detached from the document"
            ))),
            Some(e) => Ok(e),
            None => Err(ProviderError::ElementNotFound(element.to_string())),
        }
    }
}

#[async_trait]
impl CapabilityProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn launch(
        &self,
        engine: EngineKind,
        options: &LaunchOptions,
    ) -> Result<BrowserHandle, ProviderError> {
        let mut state = self.state.lock();
        state.calls.push(MockCall::Launch {
            engine,
            headless: options.headless,
            args: options.args.clone(),
        });
        if let Some(message) = &state.script.launch_error {
            return Err(ProviderError::LaunchFailed(message.clone()));
        }
        state.last_launch = Some(options.clone());
        let handle = BrowserHandle::new(state.next("B"));
        state
            .browsers
            .insert(handle.clone(), BrowserEntry { contexts: Vec::new() });
        Ok(handle)
    }

    async fn new_context(
        &self,
        browser: &BrowserHandle,
        options: &ContextOptions,
    ) -> Result<ContextHandle, ProviderError> {
        let mut state = self.state.lock();
        state.calls.push(MockCall::NewContext {
            browser: browser.clone(),
            isolated: options.isolated,
        });
        if !state.browsers.contains_key(browser) {
            return Err(ProviderError::BrowserNotFound(browser.to_string()));
        }
        let handle = ContextHandle::new(state.next("C"));
        state.contexts.insert(
            handle.clone(),
            ContextEntry {
                browser: browser.clone(),
                options: options.clone(),
                pages: Vec::new(),
            },
        );
        if let Some(entry) = state.browsers.get_mut(browser) {
            entry.contexts.push(handle.clone());
        }
        Ok(handle)
    }

    async fn new_page(&self, context: &ContextHandle) -> Result<PageHandle, ProviderError> {
        let mut state = self.state.lock();
        state.calls.push(MockCall::NewPage {
            context: context.clone(),
        });
        if !state.contexts.contains_key(context) {
            return Err(ProviderError::ContextNotFound(context.to_string()));
        }
        let handle = PageHandle::new(state.next("P"));
        state.pages.insert(
            handle.clone(),
            PageEntry {
                context: context.clone(),
                url: None,
            },
        );
        if let Some(entry) = state.contexts.get_mut(context) {
            entry.pages.push(handle.clone());
        }
        Ok(handle)
    }

    async fn list_pages(&self, context: &ContextHandle) -> Result<Vec<PageHandle>, ProviderError> {
        self.state
            .lock()
            .contexts
            .get(context)
            .map(|c| c.pages.clone())
            .ok_or_else(|| ProviderError::ContextNotFound(context.to_string()))
    }

    async fn goto(
        &self,
        page: &PageHandle,
        url: &str,
        options: &GotoOptions,
    ) -> Result<(), ProviderError> {
        let delay = {
            let mut state = self.state.lock();
            state.calls.push(MockCall::Goto {
                page: page.clone(),
                url: url.to_string(),
                wait_until: options.wait_until.as_str().to_string(),
                timeout_ms: options.timeout_ms,
            });
            state.script.navigation_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if let Some(message) = &state.script.navigation_error {
            return Err(ProviderError::NavigationFailed(format!("{url}: {message}")));
        }
        match state.pages.get_mut(page) {
            Some(entry) => {
                entry.url = Some(url.to_string());
                Ok(())
            }
            None => Err(ProviderError::PageNotFound(page.to_string())),
        }
    }

    async fn reload(&self, page: &PageHandle, _options: &GotoOptions) -> Result<(), ProviderError> {
        self.record(MockCall::Reload { page: page.clone() });
        self.ensure_page(page)
    }

    async fn wait_for_selector(
        &self,
        page: &PageHandle,
        selector: &str,
        timeout_ms: u64,
    ) -> Result<(), ProviderError> {
        self.ensure_page(page)?;
        let mut state = self.state.lock();
        state.calls.push(MockCall::WaitForSelector {
            selector: selector.to_string(),
            timeout_ms,
        });
        let attempt = {
            let counter = state.attempts.entry(selector.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };
        let available = !state.script.missing.contains(selector)
            && state
                .script
                .available_after
                .get(selector)
                .is_none_or(|&after| attempt >= after);
        if available {
            Ok(())
        } else {
            Err(ProviderError::SelectorTimeout {
                selector: selector.to_string(),
                timeout_ms,
            })
        }
    }

    async fn click(
        &self,
        page: &PageHandle,
        selector: &str,
        options: &ClickOptions,
    ) -> Result<(), ProviderError> {
        self.ensure_page(page)?;
        self.record(MockCall::Click {
            selector: selector.to_string(),
            click_count: options.click_count,
            wait_for_navigation: options.wait_for_navigation,
        });
        Ok(())
    }

    async fn fill(
        &self,
        page: &PageHandle,
        selector: &str,
        text: &str,
    ) -> Result<(), ProviderError> {
        self.ensure_page(page)?;
        let mut state = self.state.lock();
        state.calls.push(MockCall::Fill {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        state.values.insert(selector.to_string(), text.to_string());
        Ok(())
    }

    async fn type_text(
        &self,
        page: &PageHandle,
        selector: &str,
        text: &str,
    ) -> Result<(), ProviderError> {
        self.ensure_page(page)?;
        let mut state = self.state.lock();
        state.calls.push(MockCall::Type {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        state
            .values
            .entry(selector.to_string())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn text_content(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<Option<String>, ProviderError> {
        self.ensure_page(page)?;
        let mut state = self.state.lock();
        state.calls.push(MockCall::Extract {
            selector: selector.to_string(),
            kind: "text",
        });
        Ok(Some(
            state
                .script
                .texts
                .get(selector)
                .cloned()
                .unwrap_or_else(|| format!("mocked {selector} text")),
        ))
    }

    async fn inner_html(&self, page: &PageHandle, selector: &str) -> Result<String, ProviderError> {
        self.ensure_page(page)?;
        let mut state = self.state.lock();
        state.calls.push(MockCall::Extract {
            selector: selector.to_string(),
            kind: "html",
        });
        Ok(state
            .script
            .html
            .get(selector)
            .cloned()
            .unwrap_or_else(|| format!("<div>mocked {selector} html</div>")))
    }

    async fn get_attribute(
        &self,
        page: &PageHandle,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, ProviderError> {
        self.ensure_page(page)?;
        let mut state = self.state.lock();
        state.calls.push(MockCall::Extract {
            selector: selector.to_string(),
            kind: "attribute",
        });
        let scripted = state
            .script
            .attributes
            .get(&(selector.to_string(), name.to_string()))
            .cloned();
        Ok(scripted.or_else(|| (name == "href").then(|| "https://example.com".to_string())))
    }

    async fn input_value(&self, page: &PageHandle, selector: &str) -> Result<String, ProviderError> {
        self.ensure_page(page)?;
        let mut state = self.state.lock();
        state.calls.push(MockCall::Extract {
            selector: selector.to_string(),
            kind: "value",
        });
        Ok(state
            .values
            .get(selector)
            .cloned()
            .unwrap_or_else(|| format!("mocked {selector} value")))
    }

    async fn query_all(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, ProviderError> {
        self.ensure_page(page)?;
        let mut state = self.state.lock();
        state.calls.push(MockCall::QueryAll {
            selector: selector.to_string(),
        });
        let elements = state
            .script
            .elements
            .get(selector)
            .cloned()
            .unwrap_or_else(|| {
                vec![MockElement::new("div").with_text(format!("mocked {selector} text"))]
            });
        let mut handles = Vec::with_capacity(elements.len());
        for element in elements {
            let handle = ElementHandle::new(state.next("E"));
            state.elements.insert(handle.clone(), element);
            handles.push(handle);
        }
        Ok(handles)
    }

    async fn element_tag_name(&self, element: &ElementHandle) -> Result<String, ProviderError> {
        Ok(self.element(element)?.tag_name)
    }

    async fn element_text_content(
        &self,
        element: &ElementHandle,
    ) -> Result<Option<String>, ProviderError> {
        Ok(self.element(element)?.text)
    }

    async fn element_attributes(
        &self,
        element: &ElementHandle,
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        Ok(self.element(element)?.attributes)
    }

    async fn element_bounding_box(
        &self,
        element: &ElementHandle,
    ) -> Result<Option<BoundingBox>, ProviderError> {
        Ok(self.element(element)?.bounding_box)
    }

    async fn wait(&self, duration: Duration) -> Result<(), ProviderError> {
        self.record(MockCall::Wait {
            millis: duration.as_millis() as u64,
        });
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn on_page_closed(
        &self,
        page: &PageHandle,
        callback: PageClosedCallback,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        if !state.pages.contains_key(page) {
            return Err(ProviderError::PageNotFound(page.to_string()));
        }
        state.callbacks.entry(page.clone()).or_default().push(callback);
        Ok(())
    }

    async fn close(&self, browser: &BrowserHandle) -> Result<(), ProviderError> {
        let callbacks = {
            let mut state = self.state.lock();
            state.calls.push(MockCall::Close {
                browser: browser.clone(),
            });
            let entry = state
                .browsers
                .remove(browser)
                .ok_or_else(|| ProviderError::BrowserNotFound(browser.to_string()))?;

            let mut pages = Vec::new();
            for context in &entry.contexts {
                if let Some(context) = state.contexts.remove(context) {
                    debug_assert_eq!(&context.browser, browser);
                    pages.extend(context.pages);
                }
            }
            let mut fired = Vec::new();
            for page in pages {
                state.pages.remove(&page);
                for callback in state.callbacks.remove(&page).unwrap_or_default() {
                    fired.push((page.clone(), callback));
                }
            }
            fired
        };

        for (page, callback) in callbacks {
            callback(page);
        }
        Ok(())
    }

    async fn open_external(&self, url: &str) -> Result<(), ProviderError> {
        self.record(MockCall::OpenExternal {
            url: url.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
