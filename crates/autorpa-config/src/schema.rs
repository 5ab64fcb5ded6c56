//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Backends the executor can be bound to.
pub const BACKENDS: &[&str] = &["mock", "playwright"];

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub playwright: PlaywrightConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Step executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Capability provider: `mock` or `playwright`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Timeout for navigation and single selector waits.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Per-attempt timeout for click and input selector waits.
    #[serde(default = "default_click_timeout_ms")]
    pub click_timeout_ms: u64,

    /// Additional selector-wait attempts for click and input steps.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Stop a workflow run at the first failed step.
    #[serde(default = "default_true")]
    pub stop_on_failure: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            default_timeout_ms: default_timeout_ms(),
            click_timeout_ms: default_click_timeout_ms(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            stop_on_failure: true,
        }
    }
}

fn default_backend() -> String {
    "mock".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_click_timeout_ms() -> u64 {
    60_000
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

/// Browser launch defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Force headless mode regardless of step parameters.
    #[serde(default)]
    pub headless: bool,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Extra engine arguments passed to every launch.
    #[serde(default)]
    pub launch_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            launch_args: Vec::new(),
        }
    }
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    720
}

/// Playwright bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaywrightConfig {
    /// Node.js executable. Looked up on `PATH` when unset.
    #[serde(default)]
    pub node_path: Option<PathBuf>,

    /// Slack added to an operation's own timeout before the bridge call is
    /// abandoned.
    #[serde(default = "default_response_margin_ms")]
    pub response_margin_ms: u64,

    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            node_path: None,
            response_margin_ms: default_response_margin_ms(),
            startup_timeout_ms: default_startup_timeout_ms(),
        }
    }
}

fn default_response_margin_ms() -> u64 {
    5_000
}

fn default_startup_timeout_ms() -> u64 {
    30_000
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write daily-rotated log files here when set.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
