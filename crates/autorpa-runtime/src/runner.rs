//! Workflow runner.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};

use autorpa_core::{CloseReason, Workflow, WorkflowError};
use autorpa_protocols::{ExecutionResult, StepError};

use crate::context::ExecutionContext;
use crate::executor::StepExecutor;

/// Lifecycle of one workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunState {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            RunState::Succeeded | RunState::Failed | RunState::Cancelled
        )
    }
}

/// Outcome of one step within a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step_id: String,
    pub type_id: String,
    pub result: ExecutionResult,
    pub duration_ms: u64,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: String,
    pub state: RunState,
    pub steps: Vec<StepReport>,
    pub variables: serde_json::Map<String, serde_json::Value>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            state: RunState::Pending,
            steps: Vec::new(),
            variables: serde_json::Map::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == RunState::Succeeded
    }

    /// Steps whose result was a failure.
    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.result.success)
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Step(#[from] StepError),
}

/// Runs a workflow's steps one at a time in graph order.
pub struct WorkflowRunner {
    executor: Arc<StepExecutor>,
    stop_on_failure: bool,
}

impl WorkflowRunner {
    pub fn new(executor: Arc<StepExecutor>) -> Self {
        Self {
            executor,
            stop_on_failure: true,
        }
    }

    /// Keep going after a failed step instead of stopping the run.
    pub fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Run every step of `workflow` against `ctx`.
    ///
    /// Unknown step types are rejected before anything runs. When the
    /// context is cancelled no further steps start and sessions this run
    /// opened are closed.
    pub async fn run(
        &self,
        workflow: &Workflow,
        ctx: &mut ExecutionContext,
    ) -> Result<RunReport, RunError> {
        let order = workflow.execution_order()?;
        for step in &order {
            if !self.executor.registry().contains(&step.type_id) {
                return Err(StepError::UnknownType(step.type_id.clone()).into());
            }
        }

        let mut report = RunReport::new();
        let preexisting: HashSet<String> = ctx.sessions().list_ids().into_iter().collect();
        let mut failed = false;

        report.state = RunState::Running;
        info!(
            "Run {} started: {} steps{}",
            report.run_id,
            order.len(),
            workflow
                .name
                .as_deref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default()
        );

        for step in order {
            if ctx.is_cancelled() {
                break;
            }

            let span = info_span!("step", id = %step.id, step_type = %step.type_id);
            let started = Instant::now();
            let result = self.executor.execute(step, ctx).instrument(span).await?;

            let success = result.success;
            report.steps.push(StepReport {
                step_id: step.id.clone(),
                type_id: step.type_id.clone(),
                result,
                duration_ms: started.elapsed().as_millis() as u64,
            });

            if !success && !ctx.is_cancelled() {
                failed = true;
                if self.stop_on_failure {
                    break;
                }
            }
        }

        report.state = if ctx.is_cancelled() {
            let opened: Vec<String> = ctx
                .created_sessions()
                .into_iter()
                .filter(|id| !preexisting.contains(id))
                .collect();
            self.release(ctx, &opened).await;
            RunState::Cancelled
        } else if failed {
            RunState::Failed
        } else {
            RunState::Succeeded
        };
        report.variables = ctx.variables.as_map().clone();
        report.finished_at = Some(Utc::now());

        info!(
            "Run {} finished: {:?} ({} steps ran)",
            report.run_id,
            report.state,
            report.steps.len()
        );
        Ok(report)
    }

    /// Best-effort close of the sessions a cancelled run opened, including
    /// one created by a step that was cut short.
    async fn release(&self, ctx: &mut ExecutionContext, opened: &[String]) {
        for id in opened {
            if !ctx.sessions().contains(id) {
                continue;
            }
            match ctx
                .sessions()
                .close_with_reason(id, CloseReason::Cancelled)
                .await
            {
                Ok(()) => ctx.log().warn(&format!("Run cancelled, closed session {id}")),
                Err(e) => warn!("Closing session {} after cancellation failed: {}", id, e),
            }
            if ctx.session_id.as_deref() == Some(id.as_str()) {
                ctx.session_id = None;
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
