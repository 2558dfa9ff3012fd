// Configuration layer for creating a backend gateway from settings

use crate::http::HttpBackend;
use crate::traits::Backend;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Where the classification backend lives when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Per-request timeout. `None` leaves it to the transport default,
    /// so a hung request stays in flight until the connection gives up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Factory for creating backends from configuration
pub struct BackendFactory;

impl BackendFactory {
    pub fn create_backend(config: &GatewayConfig) -> Result<Arc<dyn Backend>> {
        let mut builder = HttpBackend::builder().base_url(&config.base_url);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Arc::new(builder.build()?))
    }
}
