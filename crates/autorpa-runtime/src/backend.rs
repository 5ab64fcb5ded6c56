//! Capability provider selection.
//!
//! The provider is chosen once, when the engine is built, and every session
//! of that engine goes through it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use autorpa_config::Config;
use autorpa_protocols::CapabilityProvider;
use autorpa_provider_mock::MockProvider;
use autorpa_provider_playwright::{PlaywrightBridgeConfig, PlaywrightProvider};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Unknown backend '{0}' (expected 'mock' or 'playwright')")]
    Unknown(String),
}

/// Which capability provider an engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Mock,
    Playwright,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Mock => "mock",
            Backend::Playwright => "playwright",
        }
    }
}

impl FromStr for Backend {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Backend::Mock),
            "playwright" => Ok(Backend::Playwright),
            other => Err(BackendError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the provider named by `config.executor.backend`.
///
/// The Playwright bridge process is not started here; it starts on the
/// first provider call.
pub fn build_provider(config: &Config) -> Result<Arc<dyn CapabilityProvider>, BackendError> {
    let backend: Backend = config.executor.backend.parse()?;
    info!("Using {} backend", backend);

    let provider: Arc<dyn CapabilityProvider> = match backend {
        Backend::Mock => Arc::new(MockProvider::new()),
        Backend::Playwright => Arc::new(PlaywrightProvider::new(PlaywrightBridgeConfig {
            node_path: config.playwright.node_path.clone(),
            response_margin: Duration::from_millis(config.playwright.response_margin_ms),
            startup_timeout: Duration::from_millis(config.playwright.startup_timeout_ms),
        })),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!("mock".parse::<Backend>().unwrap(), Backend::Mock);
        assert_eq!(" Playwright ".parse::<Backend>().unwrap(), Backend::Playwright);
        let err = "selenium".parse::<Backend>().unwrap_err();
        assert!(err.to_string().contains("selenium"));
    }

    #[test]
    fn test_build_mock_provider() {
        let provider = build_provider(&Config::default()).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn test_build_playwright_provider_is_lazy() {
        let mut config = Config::default();
        config.executor.backend = "playwright".to_string();
        config.playwright.node_path = Some("/nonexistent/node".into());
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.name(), "playwright");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let mut config = Config::default();
        config.executor.backend = "puppeteer".to_string();
        assert!(build_provider(&config).is_err());
    }
}
