//! Internal bookkeeping for the mock provider.

use std::collections::{HashMap, HashSet};

use autorpa_protocols::{
    BrowserHandle, ContextHandle, ContextOptions, ElementHandle, EngineKind, LaunchOptions,
    PageHandle, PageClosedCallback,
};

use crate::MockElement;

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Launch { engine: EngineKind, headless: bool, args: Vec<String> },
    NewContext { browser: BrowserHandle, isolated: bool },
    NewPage { context: ContextHandle },
    Goto { page: PageHandle, url: String, wait_until: String, timeout_ms: u64 },
    Reload { page: PageHandle },
    WaitForSelector { selector: String, timeout_ms: u64 },
    Click { selector: String, click_count: u32, wait_for_navigation: bool },
    Fill { selector: String, text: String },
    Type { selector: String, text: String },
    Extract { selector: String, kind: &'static str },
    QueryAll { selector: String },
    Wait { millis: u64 },
    Close { browser: BrowserHandle },
    OpenExternal { url: String },
}

/// Scripted behavior.
#[derive(Default)]
pub(crate) struct Script {
    pub texts: HashMap<String, String>,
    pub html: HashMap<String, String>,
    pub attributes: HashMap<(String, String), String>,
    pub available_after: HashMap<String, u32>,
    pub missing: HashSet<String>,
    pub elements: HashMap<String, Vec<MockElement>>,
    pub launch_error: Option<String>,
    pub navigation_error: Option<String>,
    pub navigation_delay: Option<std::time::Duration>,
}

pub(crate) struct BrowserEntry {
    pub contexts: Vec<ContextHandle>,
}

pub(crate) struct ContextEntry {
    pub browser: BrowserHandle,
    pub options: ContextOptions,
    pub pages: Vec<PageHandle>,
}

pub(crate) struct PageEntry {
    pub context: ContextHandle,
    pub url: Option<String>,
}

#[derive(Default)]
pub(crate) struct State {
    pub next_id: u64,
    pub script: Script,
    pub browsers: HashMap<BrowserHandle, BrowserEntry>,
    pub contexts: HashMap<ContextHandle, ContextEntry>,
    pub pages: HashMap<PageHandle, PageEntry>,
    pub elements: HashMap<ElementHandle, MockElement>,
    pub callbacks: HashMap<PageHandle, Vec<PageClosedCallback>>,
    pub attempts: HashMap<String, u32>,
    pub values: HashMap<String, String>,
    pub calls: Vec<MockCall>,
    pub last_launch: Option<LaunchOptions>,
}

impl State {
    pub fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    /// Remove a page and hand back its close callbacks.
    pub fn remove_page(&mut self, page: &PageHandle) -> Vec<PageClosedCallback> {
        if let Some(entry) = self.pages.remove(page) {
            if let Some(context) = self.contexts.get_mut(&entry.context) {
                context.pages.retain(|p| p != page);
            }
        }
        self.callbacks.remove(page).unwrap_or_default()
    }
}
