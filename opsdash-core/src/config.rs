//! Configuration loading and validation

use crate::error::{ErrorContext, OpsdashError, OpsdashResult};
use crate::types::OpsdashConfig;

use std::path::Path;

impl OpsdashConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> OpsdashResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OpsdashError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: OpsdashConfig = toml::from_str(&content).map_err(|e| OpsdashError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> OpsdashResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| OpsdashError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| OpsdashError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> OpsdashResult<()> {
        if let Err(e) = url::Url::parse(&self.api.base_url) {
            return Err(OpsdashError::Config {
                message: format!("Invalid API base URL '{}': {}", self.api.base_url, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.base_url to a full URL like https://api.example.com"),
            });
        }

        if self.api.tenant_id.is_empty() {
            return Err(OpsdashError::Config {
                message: "Tenant identifier must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.tenant_id to your organization identifier"),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(OpsdashError::Config {
                message: "Request timeout must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.timeout_seconds to a positive value"),
            });
        }

        if self.storage.persist_session && self.storage.data_dir.is_empty() {
            return Err(OpsdashError::Config {
                message: "Data directory must be set when session persistence is enabled"
                    .to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set storage.data_dir or disable storage.persist_session"),
            });
        }

        Ok(())
    }
}
