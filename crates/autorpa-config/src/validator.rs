//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{BACKENDS, Config};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// First error as a [`ConfigError`], if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::validate_executor(config, &mut result);
        Self::validate_browser(config, &mut result);
        Self::validate_playwright(config, &mut result);
        result
    }

    fn validate_executor(config: &Config, result: &mut ValidationResult) {
        let executor = &config.executor;
        if !BACKENDS.contains(&executor.backend.as_str()) {
            result.add_error(ValidationError::new(
                "executor.backend",
                format!(
                    "Unknown backend '{}', valid values: {:?}",
                    executor.backend, BACKENDS
                ),
            ));
        }

        if executor.default_timeout_ms == 0 || executor.click_timeout_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "executor",
                "A zero timeout makes every selector wait fail immediately",
            ));
        }

        if executor.retry_count > 0 && executor.retry_delay_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "executor.retry_delay_ms",
                "Retries without a delay are unlikely to find a late element",
            ));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.viewport_width == 0 {
            result.add_error(ValidationError::new(
                "browser.viewport_width",
                "viewport_width must be greater than 0",
            ));
        }
        if config.browser.viewport_height == 0 {
            result.add_error(ValidationError::new(
                "browser.viewport_height",
                "viewport_height must be greater than 0",
            ));
        }
    }

    fn validate_playwright(config: &Config, result: &mut ValidationResult) {
        if config.playwright.response_margin_ms == 0 {
            result.add_error(ValidationError::new(
                "playwright.response_margin_ms",
                "response_margin_ms must be greater than 0",
            ));
        }

        if let Some(path) = &config.playwright.node_path {
            if !path.exists() {
                result.add_warning(ValidationWarning::new(
                    "playwright.node_path",
                    format!("Node.js executable does not exist: {:?}", path),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let result = ConfigValidator::validate(&Config::default());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unknown_backend() {
        let mut config = Config::default();
        config.executor.backend = "selenium".to_string();
        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "executor.backend"));
    }

    #[test]
    fn test_playwright_backend_is_valid() {
        let mut config = Config::default();
        config.executor.backend = "playwright".to_string();
        assert!(ConfigValidator::validate(&config).is_valid());
    }

    #[test]
    fn test_zero_viewport() {
        let mut config = Config::default();
        config.browser.viewport_height = 0;
        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.path == "browser.viewport_height"));
    }

    #[test]
    fn test_zero_response_margin() {
        let mut config = Config::default();
        config.playwright.response_margin_ms = 0;
        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_retry_without_delay_warns() {
        let mut config = Config::default();
        config.executor.retry_delay_ms = 0;
        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_missing_node_path_warns() {
        let mut config = Config::default();
        config.playwright.node_path = Some("/nonexistent/bin/node".into());
        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "playwright.node_path"));
    }

    #[test]
    fn test_into_result() {
        let mut config = Config::default();
        config.executor.backend = "nope".to_string();
        let err = ConfigValidator::validate(&config).into_result().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "executor.backend"));
    }
}
