//! Executor settings derived from configuration.

use serde_json::Value;

use autorpa_config::Config;
use autorpa_protocols::Viewport;

/// Process-wide executor defaults.
///
/// Timeout and retry values stand in for schema defaults when a stored step
/// omits the parameter entirely. Browser values apply to every new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    pub default_timeout_ms: u64,
    pub click_timeout_ms: u64,
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub stop_on_failure: bool,
    /// Force every new session headless regardless of the step parameter.
    pub force_headless: bool,
    pub viewport: Viewport,
    pub launch_args: Vec<String>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ExecutorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_timeout_ms: config.executor.default_timeout_ms,
            click_timeout_ms: config.executor.click_timeout_ms,
            retry_count: config.executor.retry_count,
            retry_delay_ms: config.executor.retry_delay_ms,
            stop_on_failure: config.executor.stop_on_failure,
            force_headless: config.browser.headless,
            viewport: Viewport::new(
                config.browser.viewport_width,
                config.browser.viewport_height,
            ),
            launch_args: config.browser.launch_args.clone(),
        }
    }

    /// Configured default for a timing parameter, if this key has one.
    pub fn fallback(&self, type_id: &str, key: &str) -> Option<Value> {
        match key {
            "timeout" => match type_id {
                "CLICK_ELEMENT" | "INPUT_TEXT" => Some(self.click_timeout_ms.into()),
                _ => Some(self.default_timeout_ms.into()),
            },
            "retryCount" => Some(self.retry_count.into()),
            "retryDelay" => Some(self.retry_delay_ms.into()),
            _ => None,
        }
    }
}
