//! Flow steps.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use autorpa_protocols::{ExecutionResult, StepError};

use super::Executable;
use crate::context::ExecutionContext;

/// Pause the run.
#[derive(Debug, Clone, Deserialize)]
pub struct Wait {
    pub seconds: f64,
}

impl Wait {
    /// Requested pause, or why it cannot be represented.
    pub fn duration(&self) -> Result<Duration, String> {
        if !self.seconds.is_finite() || self.seconds < 0.0 {
            return Err(format!(
                "'seconds' must be a non-negative number, got {}",
                self.seconds
            ));
        }
        Duration::try_from_secs_f64(self.seconds)
            .map_err(|_| format!("'seconds' is too large: {}", self.seconds))
    }
}

#[async_trait]
impl Executable for Wait {
    fn check(&self) -> Result<(), String> {
        self.duration().map(|_| ())
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        let duration = self
            .duration()
            .map_err(|reason| StepError::validation("WAIT", reason))?;
        ctx.log().debug(&format!("Waiting {:?}", duration));

        tokio::select! {
            _ = ctx.cancellation().cancelled() => return Err(StepError::Cancelled),
            waited = ctx.provider().wait(duration) => waited?,
        }

        Ok(ExecutionResult::success_with(json!({
            "waitedMs": duration.as_millis() as u64,
        })))
    }
}
