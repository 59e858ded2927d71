//! Shared configuration types for the opsdash workspace

use serde::{Deserialize, Serialize};

/// Top-level opsdash configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpsdashConfig {
    /// API endpoint configuration
    pub api: ApiConfig,
    /// Client-side storage configuration
    pub storage: StorageConfig,
}

/// Configuration for the dashboard API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Tenant identifier sent with every request
    pub tenant_id: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            tenant_id: "tester".to_string(),
            timeout_seconds: 30,
            user_agent: "opsdash/0.1".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create a configuration for the given API base URL and tenant
    pub fn new<S: Into<String>, T: Into<String>>(base_url: S, tenant_id: T) -> Self {
        Self {
            base_url: base_url.into(),
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set user agent
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Configuration for durable client-side state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted session record
    pub data_dir: String,
    /// Whether the session survives process restarts
    pub persist_session: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.opsdash/data".to_string(),
            persist_session: true,
        }
    }
}
