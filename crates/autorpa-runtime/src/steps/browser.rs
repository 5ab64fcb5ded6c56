//! Browser lifecycle and navigation steps.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use autorpa_core::{Session, SessionRequest};
use autorpa_protocols::{
    EngineKind, EngineSelection, ExecutionResult, GotoOptions, StepError, WaitUntil, WindowState,
};

use super::{Executable, require_non_empty};
use crate::context::ExecutionContext;

/// Open a URL, in a new or reused session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserOpen {
    pub url: String,
    pub open_mode: String,
    pub browser_type: String,
    pub headless: bool,
    pub incognito: bool,
    pub window_size: String,
    pub custom_width: u32,
    pub custom_height: u32,
    pub wait_until: WaitUntil,
    pub timeout: u64,
}

impl BrowserOpen {
    pub fn reuses_existing(&self) -> bool {
        self.open_mode == "useExisting"
    }

    pub fn window_state(&self) -> WindowState {
        match self.window_size.as_str() {
            "maximized" => WindowState::Maximized,
            "fullscreen" => WindowState::Fullscreen,
            "custom" => WindowState::Custom {
                width: self.custom_width,
                height: self.custom_height,
            },
            _ => WindowState::Default,
        }
    }

    fn goto_options(&self) -> GotoOptions {
        GotoOptions {
            wait_until: self.wait_until,
            timeout_ms: self.timeout,
        }
    }

    async fn open_external(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        ctx.log().warn(&format!(
            "Browser '{}' is not supported, opening {} with the system default handler",
            self.browser_type, self.url
        ));
        ctx.provider().open_external(&self.url).await?;
        Ok(ExecutionResult::success_with(json!({
            "url": self.url,
            "external": true,
        })))
    }

    async fn navigate(
        &self,
        ctx: &ExecutionContext,
        session: &Session,
        reused: bool,
    ) -> ExecutionResult {
        let page = session.current_page();
        match ctx.provider().goto(&page, &self.url, &self.goto_options()).await {
            Ok(()) => ExecutionResult::success_with(json!({
                "sessionId": session.id(),
                "url": self.url,
                "engine": session.engine(),
                "reused": reused,
            }))
            .with_session(session.id()),
            // The session stays registered so the run can still close it.
            Err(e) => ExecutionResult::failure(e.to_string()).with_session(session.id()),
        }
    }
}

#[async_trait]
impl Executable for BrowserOpen {
    fn check(&self) -> Result<(), String> {
        require_non_empty("url", &self.url)
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        let engine = match EngineKind::normalize(&self.browser_type) {
            EngineSelection::Engine(engine) => engine,
            EngineSelection::External => return self.open_external(ctx).await,
        };
        if EngineKind::is_collapsed_alias(&self.browser_type) {
            ctx.log().warn(&format!(
                "Browser '{}' has no engine of its own, using {}",
                self.browser_type, engine
            ));
        }

        if self.reuses_existing() {
            let reusable = ctx.sessions().find_reusable(engine, self.incognito);
            if let Some(session) = reusable.and_then(|id| ctx.sessions().get(&id).ok()) {
                let _guard = session.lock().await;
                ctx.log()
                    .info(&format!("Reusing session {} for {}", session.id(), self.url));
                return Ok(self.navigate(ctx, &session, true).await);
            }
            debug!("No reusable {} session, launching a new one", engine);
        }

        let settings = ctx.settings();
        let request = SessionRequest::new(engine)
            .private(self.incognito)
            .headless(self.headless || settings.force_headless)
            .window(self.window_state())
            .default_viewport(settings.viewport)
            .launch_args(settings.launch_args.clone());

        let session = ctx.sessions().create_session(&request).await?;
        ctx.note_created(session.id());
        let _guard = session.lock().await;
        ctx.log().info(&format!(
            "Opened session {} ({}), navigating to {}",
            session.id(),
            engine,
            self.url
        ));
        Ok(self.navigate(ctx, &session, false).await)
    }
}

/// Close a session and release its browser.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserClose {
    pub browser_id: String,
}

#[async_trait]
impl Executable for BrowserClose {
    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        let (session, guard) = ctx.lock_session(&self.browser_id).await?;
        let id = session.id().to_string();
        drop(guard);

        ctx.sessions().close_session(&id).await?;
        Ok(ExecutionResult::success()
            .with_session(id)
            .with_side_effect("closed", json!(true)))
    }
}

/// Reload the current page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserRefresh {
    pub wait_for_load: bool,
    pub timeout: u64,
    pub browser_id: String,
}

#[async_trait]
impl Executable for BrowserRefresh {
    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        let (session, _guard) = ctx.lock_session(&self.browser_id).await?;
        let options = load_options(self.wait_for_load, self.timeout);
        ctx.provider()
            .reload(&session.current_page(), &options)
            .await?;
        Ok(ExecutionResult::success().with_session(session.id()))
    }
}

/// Navigate the current page to a URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserNavigate {
    pub url: String,
    pub wait_for_load: bool,
    pub timeout: u64,
    pub browser_id: String,
}

#[async_trait]
impl Executable for BrowserNavigate {
    fn check(&self) -> Result<(), String> {
        require_non_empty("url", &self.url)
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        let (session, _guard) = ctx.lock_session(&self.browser_id).await?;
        let options = load_options(self.wait_for_load, self.timeout);
        ctx.provider()
            .goto(&session.current_page(), &self.url, &options)
            .await?;
        Ok(ExecutionResult::success_with(json!({ "url": self.url })).with_session(session.id()))
    }
}

fn load_options(wait_for_load: bool, timeout_ms: u64) -> GotoOptions {
    GotoOptions {
        wait_until: if wait_for_load {
            WaitUntil::Load
        } else {
            WaitUntil::Commit
        },
        timeout_ms,
    }
}
