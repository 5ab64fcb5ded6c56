use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;

use autorpa_protocols::{
    BrowserHandle, ContextHandle, EngineKind, PageHandle, Viewport, WindowState,
};

use crate::registry::Registerable;

/// Parameters for opening a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub engine: EngineKind,
    /// Isolated (incognito) context. Private sessions are never reused.
    pub private: bool,
    pub headless: bool,
    pub window: WindowState,
    /// Viewport used when the window state does not dictate one.
    pub default_viewport: Viewport,
    pub launch_args: Vec<String>,
}

impl SessionRequest {
    pub fn new(engine: EngineKind) -> Self {
        Self {
            engine,
            private: false,
            headless: false,
            window: WindowState::Default,
            default_viewport: Viewport::default(),
            launch_args: Vec::new(),
        }
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn window(mut self, window: WindowState) -> Self {
        self.window = window;
        self
    }

    pub fn default_viewport(mut self, viewport: Viewport) -> Self {
        self.default_viewport = viewport;
        self
    }

    pub fn launch_args(mut self, args: Vec<String>) -> Self {
        self.launch_args = args;
        self
    }
}

/// One live browser session.
pub struct Session {
    id: String,
    engine: EngineKind,
    private: bool,
    browser: BrowserHandle,
    context: ContextHandle,
    page: Mutex<PageHandle>,
    lock: Arc<tokio::sync::Mutex<()>>,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        engine: EngineKind,
        private: bool,
        browser: BrowserHandle,
        context: ContextHandle,
        page: PageHandle,
    ) -> Self {
        Self {
            id: id.into(),
            engine,
            private,
            browser,
            context,
            page: Mutex::new(page),
            lock: Arc::new(tokio::sync::Mutex::new(())),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn browser(&self) -> &BrowserHandle {
        &self.browser
    }

    pub fn context(&self) -> &ContextHandle {
        &self.context
    }

    /// Page that steps operate on.
    pub fn current_page(&self) -> PageHandle {
        self.page.lock().clone()
    }

    pub fn set_current_page(&self, page: PageHandle) {
        *self.page.lock() = page;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Serialize operations on this session. Held for a whole step.
    pub async fn lock(&self) -> OwnedMutexGuard<()> {
        self.lock.clone().lock_owned().await
    }

    /// Whether some step currently holds the session.
    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id.clone(),
            engine: self.engine,
            private: self.private,
            created_at: self.created_at,
        }
    }
}

impl Registerable for Session {
    fn registry_id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("engine", &self.engine)
            .field("private", &self.private)
            .field("browser", &self.browser)
            .finish_non_exhaustive()
    }
}

/// Serializable summary of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub engine: EngineKind,
    pub private: bool,
    pub created_at: DateTime<Utc>,
}
