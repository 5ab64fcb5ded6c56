//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::Config;
use crate::validator::ConfigValidator;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default config location, `~/.autorpa/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".autorpa").join("config.toml"))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        Self::expand_paths(&mut config);
        Ok(config)
    }

    /// Reject configurations that cannot work. Warnings are returned.
    pub fn validate(config: &Config) -> Result<Vec<String>, ConfigError> {
        let warnings = ConfigValidator::validate(config).into_result()?;
        Ok(warnings
            .into_iter()
            .map(|w| format!("{}: {}", w.path, w.message))
            .collect())
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    fn expand_paths(config: &mut Config) {
        if let Some(path) = config.playwright.node_path.take() {
            config.playwright.node_path = Some(Self::expand_path_buf(&path));
        }
        if let Some(path) = config.logging.directory.take() {
            config.logging.directory = Some(Self::expand_path_buf(&path));
        }
    }

    fn expand_path_buf(path: &Path) -> PathBuf {
        PathBuf::from(Self::expand_path(&path.to_string_lossy()))
    }

    /// Expand shell-style paths (e.g., `~/.autorpa`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.executor.backend, "mock");
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [executor]
            backend = "playwright"
            click_timeout_ms = 10000
            retry_count = 4
            retry_delay_ms = 250
            stop_on_failure = false

            [browser]
            headless = true
            viewport_width = 1920
            viewport_height = 1080
            launch_args = ["--disable-gpu"]

            [playwright]
            response_margin_ms = 2000

            [logging]
            level = "debug"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.executor.backend, "playwright");
        assert_eq!(config.executor.click_timeout_ms, 10_000);
        assert_eq!(config.executor.retry_count, 4);
        assert!(!config.executor.stop_on_failure);
        assert!(config.browser.headless);
        assert_eq!(config.browser.launch_args, vec!["--disable-gpu"]);
        assert_eq!(config.playwright.response_margin_ms, 2_000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[executor]").unwrap();
        writeln!(file, "retry_count = 7").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.executor.retry_count, 7);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.executor.retry_count, 2);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("AUTORPA_TEST_BACKEND", "playwright");
        }
        let config = ConfigLoader::load_str("[executor]\nbackend = \"${AUTORPA_TEST_BACKEND}\"")
            .unwrap();
        assert_eq!(config.executor.backend, "playwright");
        unsafe {
            std::env::remove_var("AUTORPA_TEST_BACKEND");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_AUTORPA_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_tilde_in_log_directory_is_expanded() {
        let config = ConfigLoader::load_str("[logging]\ndirectory = \"~/logs\"").unwrap();
        let directory = config.logging.directory.unwrap();
        assert!(!directory.to_string_lossy().starts_with('~'));
        assert!(directory.ends_with("logs"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/usr/local/bin"), "/usr/local/bin");
    }

    #[test]
    fn test_validate_rejects_unknown_backend() {
        let config = ConfigLoader::load_str("[executor]\nbackend = \"selenium\"").unwrap();
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_returns_warnings() {
        let config = ConfigLoader::load_str("[executor]\nretry_delay_ms = 0").unwrap();
        let warnings = ConfigLoader::validate(&config).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("executor.retry_delay_ms"));
    }

    #[test]
    fn test_default_path() {
        if let Some(path) = ConfigLoader::default_path() {
            assert!(path.ends_with(".autorpa/config.toml"));
        }
    }
}
