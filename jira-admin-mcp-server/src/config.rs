//! Configuration management for the Jira admin MCP server
//!
//! Handles loading configuration from environment variables, TOML files,
//! and provides sensible defaults for all settings.

use crate::client::{ClientOptions, Credentials, RetryHandler};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Largest page size accepted by the Atlassian list endpoints
pub const MAX_PAGE_SIZE_CEILING: u32 = 100;

/// Main configuration structure for the Jira admin MCP server
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Atlassian Cloud instance URL, e.g. https://acme.atlassian.net (required)
    pub instance_url: String,

    /// Atlassian account email used as the Basic auth user (required)
    pub user_email: String,

    /// Atlassian API token (required)
    #[serde(skip_serializing)]
    pub api_token: String,

    /// Refuse destructive tools (default: false)
    pub read_only: bool,

    /// HTTP request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,

    /// Maximum page size a tool may request (default: 100)
    pub max_page_size: u32,

    /// Backoff policies for 429 and 5xx responses
    pub retry: RetryHandler,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            instance_url: String::new(),
            user_email: String::new(),
            api_token: String::new(),
            read_only: false,
            request_timeout_seconds: 30,
            max_page_size: MAX_PAGE_SIZE_CEILING,
            retry: RetryHandler::default(),
        }
    }
}

impl fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraConfig")
            .field("instance_url", &self.instance_url)
            .field("user_email", &self.user_email)
            .field("api_token", &"<redacted>")
            .field("read_only", &self.read_only)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_page_size", &self.max_page_size)
            .field("retry", &self.retry)
            .finish()
    }
}

impl JiraConfig {
    /// Load configuration from environment variables, TOML file, and defaults
    /// Priority: env vars > TOML file > defaults
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(file_config) = Self::load_from_file("config/jira-admin-mcp.toml") {
            info!("Loaded configuration from TOML file");
            config = file_config;
        } else if let Ok(file_config) = Self::load_from_file("jira-admin-mcp.toml") {
            info!("Loaded configuration from TOML file in current directory");
            config = file_config;
        } else {
            debug!("No TOML configuration file found, using defaults and environment variables");
        }

        config.load_from_env()?;
        config.normalise();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Load configuration from environment variables
    fn load_from_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("JIRA_INSTANCE_URL") {
            self.instance_url = url;
            debug!("Loaded JIRA_INSTANCE_URL from environment");
        }

        if let Ok(email) = env::var("JIRA_USER_EMAIL") {
            self.user_email = email;
            debug!("Loaded JIRA_USER_EMAIL from environment");
        }

        if let Ok(token) = env::var("JIRA_API_TOKEN") {
            self.api_token = token;
            debug!("Loaded JIRA_API_TOKEN from environment");
        }

        if let Ok(read_only) = env::var("JIRA_READ_ONLY") {
            self.read_only = matches!(
                read_only.trim().to_lowercase().as_str(),
                "true" | "1" | "yes"
            );
            debug!("Set read-only mode to {} from environment", self.read_only);
        }

        if let Ok(timeout) = env::var("JIRA_REQUEST_TIMEOUT") {
            self.request_timeout_seconds = timeout
                .trim()
                .parse::<u64>()
                .with_context(|| {
                    format!(
                        "JIRA_REQUEST_TIMEOUT must be a number of seconds, got '{}'",
                        timeout
                    )
                })?;
            debug!(
                "Set request timeout to {} seconds from environment",
                self.request_timeout_seconds
            );
        }

        if let Ok(page_size) = env::var("JIRA_MAX_PAGE_SIZE") {
            self.max_page_size = page_size
                .trim()
                .parse::<u32>()
                .with_context(|| {
                    format!(
                        "JIRA_MAX_PAGE_SIZE must be a positive integer, got '{}'",
                        page_size
                    )
                })?;
            debug!("Set max page size to {} from environment", self.max_page_size);
        }

        Ok(())
    }

    /// Trim whitespace and strip trailing slashes from the instance URL
    fn normalise(&mut self) {
        self.instance_url = self.instance_url.trim().trim_end_matches('/').to_string();
        self.user_email = self.user_email.trim().to_string();
        self.api_token = self.api_token.trim().to_string();
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.instance_url.is_empty() {
            return Err(anyhow::anyhow!(
                "Jira instance URL is required. Set JIRA_INSTANCE_URL environment variable \
                 or configure in TOML file."
            ));
        }

        if !self.instance_url.starts_with("http://") && !self.instance_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "Jira instance URL must start with http:// or https://. Got: {}",
                self.instance_url
            ));
        }

        if self.user_email.is_empty() || !self.user_email.contains('@') {
            return Err(anyhow::anyhow!(
                "JIRA_USER_EMAIL must be a valid email address"
            ));
        }

        if self.api_token.is_empty() {
            return Err(anyhow::anyhow!("JIRA_API_TOKEN must not be empty"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("request_timeout_seconds must be greater than 0"));
        }

        if self.max_page_size == 0 || self.max_page_size > MAX_PAGE_SIZE_CEILING {
            return Err(anyhow::anyhow!(
                "max_page_size must be between 1 and {}",
                MAX_PAGE_SIZE_CEILING
            ));
        }

        self.retry
            .rate_limit
            .validate("rate_limit")
            .map_err(|e| anyhow::anyhow!(e))?;
        self.retry
            .server_error
            .validate("server_error")
            .map_err(|e| anyhow::anyhow!(e))?;

        info!("Configuration validation successful");
        Ok(())
    }

    /// Basic auth credentials for both API surfaces
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.user_email, &self.api_token)
    }

    /// Transport settings for both API surfaces
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.request_timeout_seconds),
            retry: self.retry,
        }
    }

    /// Normalise and validate a configuration built in code
    pub fn validated(mut self) -> Result<Self> {
        self.normalise();
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RetryPolicy;
    use serial_test::serial;
    use std::env;

    fn valid_config() -> JiraConfig {
        JiraConfig {
            instance_url: "https://test.atlassian.net".to_string(),
            user_email: "user@example.com".to_string(),
            api_token: "s3cr3t-value".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = JiraConfig::default();
        assert_eq!(config.request_timeout_seconds, 30);
        assert_eq!(config.max_page_size, 100);
        assert!(!config.read_only);
        assert_eq!(config.retry.rate_limit, RetryPolicy::rate_limit());
        assert_eq!(config.retry.server_error, RetryPolicy::server_error());
    }

    #[test]
    #[serial]
    fn test_env_var_loading() {
        env::set_var("JIRA_INSTANCE_URL", "https://test.atlassian.net/");
        env::set_var("JIRA_USER_EMAIL", " user@example.com ");
        env::set_var("JIRA_API_TOKEN", "test_token");
        env::set_var("JIRA_READ_ONLY", "Yes");
        env::set_var("JIRA_REQUEST_TIMEOUT", "45");
        env::set_var("JIRA_MAX_PAGE_SIZE", " 25 ");

        let mut config = JiraConfig::default();
        config.load_from_env().unwrap();
        config.normalise();

        assert_eq!(config.instance_url, "https://test.atlassian.net");
        assert_eq!(config.user_email, "user@example.com");
        assert_eq!(config.api_token, "test_token");
        assert!(config.read_only);
        assert_eq!(config.request_timeout_seconds, 45);
        assert_eq!(config.max_page_size, 25);
        assert!(config.validate().is_ok());

        env::remove_var("JIRA_INSTANCE_URL");
        env::remove_var("JIRA_USER_EMAIL");
        env::remove_var("JIRA_API_TOKEN");
        env::remove_var("JIRA_READ_ONLY");
        env::remove_var("JIRA_REQUEST_TIMEOUT");
        env::remove_var("JIRA_MAX_PAGE_SIZE");
    }

    #[test]
    #[serial]
    fn test_invalid_timeout_env_var() {
        env::set_var("JIRA_REQUEST_TIMEOUT", "soon");
        let mut config = JiraConfig::default();
        assert!(config.load_from_env().is_err());
        env::remove_var("JIRA_REQUEST_TIMEOUT");
    }

    #[test]
    #[serial]
    fn test_invalid_max_page_size_env_var() {
        env::set_var("JIRA_MAX_PAGE_SIZE", "lots");
        let mut config = JiraConfig::default();
        let err = config.load_from_env().unwrap_err();
        assert!(format!("{:#}", err).contains("JIRA_MAX_PAGE_SIZE"));

        env::set_var("JIRA_MAX_PAGE_SIZE", "-5");
        assert!(JiraConfig::default().load_from_env().is_err());

        // Parses, but is outside 1..=100
        env::set_var("JIRA_MAX_PAGE_SIZE", "0");
        let mut config = valid_config();
        config.load_from_env().unwrap();
        assert_eq!(config.max_page_size, 0);
        assert!(config.validate().is_err());

        env::remove_var("JIRA_MAX_PAGE_SIZE");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = JiraConfig::default();
        assert!(config.validate().is_err());

        config = valid_config();
        config.instance_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config = valid_config();
        config.user_email = "no-at-sign".to_string();
        assert!(config.validate().is_err());

        config = valid_config();
        config.api_token = String::new();
        assert!(config.validate().is_err());

        config = valid_config();
        config.max_page_size = 500;
        assert!(config.validate().is_err());

        config = valid_config();
        config.retry.server_error.multiplier = 0.0;
        assert!(config.validate().is_err());

        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_toml_parsing_with_partial_retry_override() {
        let config: JiraConfig = toml::from_str(
            r#"
            instance_url = "https://acme.atlassian.net"
            user_email = "admin@acme.com"
            api_token = "abc"
            read_only = true

            [retry.server_error]
            max_retries = 1
            initial_delay_secs = 0.5
            max_delay_secs = 4.0
            multiplier = 3.0
            "#,
        )
        .unwrap();

        assert!(config.read_only);
        assert_eq!(config.request_timeout_seconds, 30);
        assert_eq!(config.retry.rate_limit, RetryPolicy::rate_limit());
        assert_eq!(config.retry.server_error.max_retries, 1);
        assert_eq!(config.retry.server_error.multiplier, 3.0);
    }

    #[test]
    fn test_token_is_never_printed() {
        let config = valid_config();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cr3t-value"));
        assert!(debug.contains("<redacted>"));
        let serialised = toml::to_string(&config).unwrap();
        assert!(!serialised.contains("s3cr3t-value"));
    }

    #[test]
    fn test_client_options() {
        let mut config = valid_config();
        config.request_timeout_seconds = 12;
        let options = config.client_options();
        assert_eq!(options.timeout, Duration::from_secs(12));
        assert_eq!(options.retry, RetryHandler::default());
    }

    #[test]
    fn test_validated_normalises() {
        let mut config = valid_config();
        config.instance_url = " https://acme.atlassian.net// ".to_string();
        let config = config.validated().unwrap();
        assert_eq!(config.instance_url, "https://acme.atlassian.net");
    }
}
