//! Engine facade.
//!
//! Wires the step-type catalog, the node factory, the session registry and
//! the executor around one capability provider. Hosts talk to this type.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use autorpa_config::Config;
use autorpa_core::{
    NodeFactory, SessionEvent, SessionRegistry, SessionRequest, StepTypeRegistry, Workflow,
};
use autorpa_protocols::{
    CapabilityProvider, ExecutionResult, RegistryError, SessionError, StepError, StepInstance,
};

use crate::backend::{BackendError, build_provider};
use crate::context::ExecutionContext;
use crate::executor::StepExecutor;
use crate::runner::{RunError, RunReport, WorkflowRunner};
use crate::settings::ExecutorSettings;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Reply to a session creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
}

/// Reply to a session close request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionClosed {
    pub success: bool,
}

pub struct Engine {
    registry: Arc<StepTypeRegistry>,
    factory: NodeFactory,
    sessions: Arc<SessionRegistry>,
    executor: Arc<StepExecutor>,
    settings: ExecutorSettings,
}

impl Engine {
    /// Build an engine around `provider` with the built-in catalog.
    pub fn new(provider: Arc<dyn CapabilityProvider>, config: &Config) -> Result<Self, EngineError> {
        let registry = Arc::new(StepTypeRegistry::with_builtins()?);
        let stats = registry
            .category_stats()
            .iter()
            .map(|(category, count)| format!("{}={}", category.as_str(), count))
            .collect::<Vec<_>>()
            .join(", ");
        info!("Registered {} step types ({})", registry.len(), stats);

        Ok(Self {
            factory: NodeFactory::new(registry.clone()),
            sessions: SessionRegistry::new(provider),
            executor: Arc::new(StepExecutor::new(registry.clone())),
            settings: ExecutorSettings::from_config(config),
            registry,
        })
    }

    /// Build an engine with the provider named in the configuration.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let provider = build_provider(config)?;
        Self::new(provider, config)
    }

    pub fn registry(&self) -> &Arc<StepTypeRegistry> {
        &self.registry
    }

    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn executor(&self) -> &Arc<StepExecutor> {
        &self.executor
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Fresh context for one run, carrying the engine's settings.
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(self.sessions.clone()).with_settings(self.settings.clone())
    }

    /// Run a single step. Only an unknown step type is an `Err`.
    pub async fn run_step(
        &self,
        step: &StepInstance,
        ctx: &mut ExecutionContext,
    ) -> Result<ExecutionResult, StepError> {
        self.executor.execute(step, ctx).await
    }

    /// Run a whole workflow in graph order.
    pub async fn run_workflow(
        &self,
        workflow: &Workflow,
        ctx: &mut ExecutionContext,
    ) -> Result<RunReport, RunError> {
        WorkflowRunner::new(self.executor.clone())
            .stop_on_failure(self.settings.stop_on_failure)
            .run(workflow, ctx)
            .await
    }

    pub async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<SessionCreated, SessionError> {
        let session = self.sessions.create_session(request).await?;
        Ok(SessionCreated {
            session_id: session.id().to_string(),
        })
    }

    /// Close a session. Unknown ids report `success: false` with a warning.
    pub async fn close_session(&self, session_id: &str) -> SessionClosed {
        match self.sessions.close_session(session_id).await {
            Ok(()) => SessionClosed { success: true },
            Err(SessionError::UnknownSession(id)) => {
                warn!("Close requested for unknown session {}", id);
                SessionClosed { success: false }
            }
            Err(e) => {
                warn!("Session {} closed with errors: {}", session_id, e);
                SessionClosed { success: true }
            }
        }
    }

    /// Receive `session-closed` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sessions.subscribe()
    }

    /// Close every open session.
    pub async fn shutdown(&self) {
        let open = self.sessions.len();
        if open > 0 {
            info!("Closing {} open sessions", open);
        }
        self.sessions.close_all().await;
    }
}
