//! Element interaction steps.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use autorpa_core::Session;
use autorpa_protocols::{ClickOptions, ExecutionResult, StepError};

use super::{Executable, require_non_empty};
use crate::context::ExecutionContext;
use crate::retry::RetryPolicy;

/// Wait for `selector` under `policy`, returning the number of attempts made.
async fn wait_with_retry(
    ctx: &ExecutionContext,
    session: &Session,
    selector: &str,
    policy: RetryPolicy,
) -> Result<u32, StepError> {
    let page = &session.current_page();
    let provider = ctx.provider().as_ref();
    let (_, attempts) = policy
        .run(selector, ctx.cancellation(), move |_| {
            provider.wait_for_selector(page, selector, policy.timeout_ms)
        })
        .await?;
    Ok(attempts)
}

/// Click an element once it exists.
///
/// In `dry_run` mode only the wait happens, which makes this step double as
/// "wait until visible".
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickElement {
    pub selector: String,
    pub wait_for_navigation: bool,
    pub click_count: u32,
    pub timeout: u64,
    pub retry_count: u32,
    pub retry_delay: u64,
    pub dry_run: bool,
    pub browser_id: String,
}

impl ClickElement {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_count, self.retry_delay, self.timeout)
    }
}

#[async_trait]
impl Executable for ClickElement {
    fn check(&self) -> Result<(), String> {
        require_non_empty("selector", &self.selector)
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        let (session, _guard) = ctx.lock_session(&self.browser_id).await?;
        let attempts = wait_with_retry(ctx, &session, &self.selector, self.retry_policy()).await?;

        if self.dry_run {
            ctx.log()
                .debug(&format!("'{}' is present (dry run, no click)", self.selector));
        } else {
            let options = ClickOptions {
                click_count: self.click_count,
                wait_for_navigation: self.wait_for_navigation,
                timeout_ms: self.timeout,
            };
            ctx.provider()
                .click(&session.current_page(), &self.selector, &options)
                .await?;
        }

        Ok(ExecutionResult::success_with(json!({
            "selector": self.selector,
            "attempts": attempts,
            "clicked": !self.dry_run,
        })))
    }
}

/// Type into an input once it exists.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputText {
    pub selector: String,
    pub text: String,
    /// Replace the field content instead of appending to it.
    pub clear_before: bool,
    pub timeout: u64,
    pub retry_count: u32,
    pub retry_delay: u64,
    pub browser_id: String,
}

impl InputText {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_count, self.retry_delay, self.timeout)
    }
}

#[async_trait]
impl Executable for InputText {
    fn check(&self) -> Result<(), String> {
        require_non_empty("selector", &self.selector)
    }

    async fn run(&self, ctx: &ExecutionContext) -> Result<ExecutionResult, StepError> {
        let (session, _guard) = ctx.lock_session(&self.browser_id).await?;
        let attempts = wait_with_retry(ctx, &session, &self.selector, self.retry_policy()).await?;

        let page = session.current_page();
        if self.clear_before {
            ctx.provider().fill(&page, &self.selector, &self.text).await?;
        } else {
            ctx.provider()
                .type_text(&page, &self.selector, &self.text)
                .await?;
        }

        Ok(ExecutionResult::success_with(json!({
            "selector": self.selector,
            "attempts": attempts,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_retry_policy_from_params() {
        let click: ClickElement = serde_json::from_value(json!({
            "selector": "#go",
            "waitForNavigation": true,
            "clickCount": 1,
            "timeout": 500,
            "retryCount": 4,
            "retryDelay": 20,
            "dryRun": false,
            "browserId": ""
        }))
        .unwrap();

        let policy = click.retry_policy();
        assert_eq!(policy.retry_count, 4);
        assert_eq!(policy.timeout_ms, 500);
        assert_eq!(policy.max_attempts(), 5);
    }

    #[test]
    fn test_blank_selector_is_rejected() {
        let input: InputText = serde_json::from_value(json!({
            "selector": "",
            "text": "hello",
            "clearBefore": true,
            "timeout": 500,
            "retryCount": 0,
            "retryDelay": 0,
            "browserId": ""
        }))
        .unwrap();

        assert_eq!(input.check().unwrap_err(), "'selector' must not be empty");
    }
}
