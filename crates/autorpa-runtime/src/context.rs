//! Per-run execution context.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;

use autorpa_core::{Session, SessionRegistry};
use autorpa_protocols::{CapabilityProvider, LogSink, ParamValues, StepError, TracingLogSink};

use crate::settings::ExecutorSettings;
use crate::variables::Variables;

/// Everything a step needs besides its own parameters.
///
/// One context belongs to one run. Steps read it; the executor updates the
/// active session and variables between steps.
pub struct ExecutionContext {
    /// Session that steps without an explicit `browserId` act on.
    pub session_id: Option<String>,
    pub variables: Variables,
    sessions: Arc<SessionRegistry>,
    log: Arc<dyn LogSink>,
    overrides: HashMap<String, ParamValues>,
    settings: ExecutorSettings,
    cancel: CancellationToken,
    home_dir: Option<PathBuf>,
    created: Mutex<Vec<String>>,
}

impl ExecutionContext {
    pub fn new(sessions: Arc<SessionRegistry>) -> Self {
        Self {
            session_id: None,
            variables: Variables::new(),
            sessions,
            log: Arc::new(TracingLogSink),
            overrides: HashMap::new(),
            settings: ExecutorSettings::default(),
            cancel: CancellationToken::new(),
            home_dir: dirs::home_dir(),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn with_log(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_settings(mut self, settings: ExecutorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Directory `~` expands to in file paths.
    pub fn with_home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    /// Override one parameter of one step for this run.
    pub fn set_override(&mut self, step_id: &str, key: &str, value: Value) {
        self.overrides
            .entry(step_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn overrides_for(&self, step_id: &str) -> Option<&ParamValues> {
        self.overrides.get(step_id)
    }

    /// Layer a step's stored values and run-time overrides over `base`.
    /// Overrides win over stored values, which win over `base`.
    pub fn layer_params(
        &self,
        step_id: &str,
        stored: &ParamValues,
        mut base: ParamValues,
    ) -> ParamValues {
        base.extend(stored.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(overrides) = self.overrides_for(step_id) {
            base.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        base
    }

    /// Record a session created while this context was running a step.
    pub fn note_created(&self, session_id: &str) {
        let mut created = self.created.lock();
        if !created.iter().any(|id| id == session_id) {
            created.push(session_id.to_string());
        }
    }

    /// Sessions created through this context, oldest first.
    pub fn created_sessions(&self) -> Vec<String> {
        self.created.lock().clone()
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn provider(&self) -> &Arc<dyn CapabilityProvider> {
        self.sessions.provider()
    }

    pub fn log(&self) -> &dyn LogSink {
        self.log.as_ref()
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn home_dir(&self) -> Option<&PathBuf> {
        self.home_dir.as_ref()
    }

    /// Session a step targets: `browser_id` when given, else the active one.
    pub fn target_session(&self, browser_id: &str) -> Result<Arc<Session>, StepError> {
        let id = if browser_id.trim().is_empty() {
            self.session_id.as_deref().ok_or(StepError::NoActiveSession)?
        } else {
            browser_id.trim()
        };
        Ok(self.sessions.get(id)?)
    }

    /// Resolve the target session and hold its lock.
    pub async fn lock_session(
        &self,
        browser_id: &str,
    ) -> Result<(Arc<Session>, OwnedMutexGuard<()>), StepError> {
        let session = self.target_session(browser_id)?;
        let guard = session.lock().await;
        Ok((session, guard))
    }
}
