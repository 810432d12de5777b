//! `server` section of the configuration.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiGatewayConfig {
    /// Listen address.
    pub bind_addr: String,

    /// Requests still running after this long are dropped, which rolls back
    /// their transaction.
    pub request_timeout_secs: u64,
}

impl Default for ApiGatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_owned(),
            request_timeout_secs: 30,
        }
    }
}

impl ApiGatewayConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
