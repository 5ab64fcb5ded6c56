//! Step executor.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use autorpa_core::StepTypeRegistry;
use autorpa_protocols::{
    ExecutionResult, LogLevel, ParamValues, StepError, StepInstance, StepTypeDefinition,
};

use crate::context::ExecutionContext;
use crate::steps::{Executable, Step};

/// Runs single steps against the context's capability provider.
///
/// Every failure becomes an `ExecutionResult { success: false }` except an
/// unknown step type, which is returned as `Err` because it means the
/// workflow or the registry is wrong.
pub struct StepExecutor {
    registry: Arc<StepTypeRegistry>,
}

impl StepExecutor {
    pub fn new(registry: Arc<StepTypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<StepTypeRegistry> {
        &self.registry
    }

    /// Parameters a step runs with, before `${name}` resolution.
    ///
    /// Later layers win: schema defaults, configured timing defaults, stored
    /// values, run-time overrides.
    pub fn merged_params(
        &self,
        definition: &StepTypeDefinition,
        step: &StepInstance,
        ctx: &ExecutionContext,
    ) -> ParamValues {
        let mut merged = definition.default_params();
        for descriptor in &definition.parameter_schema {
            if let Some(value) = ctx.settings().fallback(&definition.type_id, &descriptor.key) {
                merged.insert(descriptor.key.clone(), value);
            }
        }
        ctx.layer_params(&step.id, &step.param_values, merged)
    }

    /// Validate, resolve and run one step.
    ///
    /// On success the context adopts the step's session and stores its data
    /// under the step's variable name.
    pub async fn execute(
        &self,
        step: &StepInstance,
        ctx: &mut ExecutionContext,
    ) -> Result<ExecutionResult, StepError> {
        let definition = match self.registry.get(&step.type_id) {
            Ok(definition) => definition,
            Err(e) => {
                ctx.log().error(&format!("Step {}: {}", step.id, e));
                return Err(e.into());
            }
        };

        if ctx.is_cancelled() {
            return Ok(self.fail(ctx, step, StepError::Cancelled));
        }

        let params = self.merged_params(&definition, step, ctx);
        if let Err(reason) = definition.validate(&params).into_result() {
            return Ok(self.fail(ctx, step, StepError::validation(&step.type_id, reason)));
        }

        let resolved = ctx.variables.resolve_params(&params);
        let typed = match Step::from_params(&definition, &resolved) {
            Ok(typed) => typed,
            Err(e) => return Ok(self.fail(ctx, step, e)),
        };

        ctx.log()
            .info(&format!("Running {} ({})", definition.display_name, step.id));
        let outcome = {
            let ctx: &ExecutionContext = ctx;
            tokio::select! {
                _ = ctx.cancellation().cancelled() => Err(StepError::Cancelled),
                result = typed.run(ctx) => result,
            }
        };

        match outcome {
            Ok(result) => {
                self.apply(ctx, step, &result);
                if result.success {
                    ctx.log().log(
                        LogLevel::Success,
                        &format!("{} ({}) completed", definition.display_name, step.id),
                        result.data.clone(),
                    );
                } else {
                    ctx.log().error(&format!(
                        "{} ({}) failed: {}",
                        definition.display_name,
                        step.id,
                        result.error.as_deref().unwrap_or("unknown error")
                    ));
                }
                Ok(result)
            }
            Err(e) if e.is_hard() => {
                ctx.log().error(&format!("Step {}: {}", step.id, e));
                Err(e)
            }
            Err(e) => Ok(self.fail(ctx, step, e)),
        }
    }

    /// Fold an error into a failed result, logging it at a level that
    /// matches its severity.
    fn fail(&self, ctx: &ExecutionContext, step: &StepInstance, error: StepError) -> ExecutionResult {
        let level = match &error {
            StepError::UnknownSession(_) | StepError::NoActiveSession | StepError::Cancelled => {
                LogLevel::Warn
            }
            _ => LogLevel::Error,
        };
        let message = error.to_string();
        ctx.log().log(
            level,
            &format!("{} ({}) failed: {}", step.type_id, step.id, message),
            None,
        );
        ExecutionResult::failure(message)
    }

    /// Carry a result's side effects into the context.
    fn apply(&self, ctx: &mut ExecutionContext, step: &StepInstance, result: &ExecutionResult) {
        let effects = &result.side_effects;

        if let Some(session_id) = effects.session_id.as_deref() {
            let closed = effects.extra.get("closed") == Some(&Value::Bool(true));
            if closed {
                if ctx.session_id.as_deref() == Some(session_id) {
                    ctx.session_id = None;
                }
            } else if ctx.session_id.as_deref() != Some(session_id) {
                debug!("Step {} switched the active session to {}", step.id, session_id);
                ctx.session_id = Some(session_id.to_string());
            }
        }

        if result.success {
            if let Some(name) = effects.variable.as_deref() {
                let value = result.data.clone().unwrap_or(Value::Null);
                ctx.variables.set(name, value);
            }
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
