//! # Client Configuration
//!
//! Azure Resource Manager client settings loaded from environment variables.

use super::{env_flag, env_var_or_default};
use std::time::Duration;

/// Azure Resource Manager client configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Resource Manager endpoint (`AZURE_ARM_ENDPOINT`)
    pub arm_endpoint: String,
    /// Microsoft.ContainerService API version (`AZURE_AKS_API_VERSION`)
    pub api_version: String,
    /// Long-running-operation poll interval in milliseconds (`POOLCTL_POLL_INTERVAL_MS`)
    /// Only used when the service does not send `Retry-After`
    pub poll_interval_ms: u64,
    /// Maximum time a single long-running operation may take (`POOLCTL_OPERATION_TIMEOUT_SECS`)
    pub operation_timeout_secs: u64,
    /// Route requests to a mock server with a mock credential (`POOLCTL_MOCK_MODE`)
    pub mock_mode: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            arm_endpoint: DEFAULT_ARM_ENDPOINT.to_string(),
            api_version: DEFAULT_AKS_API_VERSION.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            mock_mode: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            arm_endpoint: env_var_or_default(
                "AZURE_ARM_ENDPOINT",
                DEFAULT_ARM_ENDPOINT.to_string(),
            ),
            api_version: env_var_or_default(
                "AZURE_AKS_API_VERSION",
                DEFAULT_AKS_API_VERSION.to_string(),
            ),
            poll_interval_ms: env_var_or_default(
                "POOLCTL_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            ),
            operation_timeout_secs: env_var_or_default(
                "POOLCTL_OPERATION_TIMEOUT_SECS",
                DEFAULT_OPERATION_TIMEOUT_SECS,
            ),
            mock_mode: env_flag("POOLCTL_MOCK_MODE"),
        }
    }

    /// Endpoint without a trailing slash, ready to have a resource ID appended
    pub fn endpoint(&self) -> &str {
        self.arm_endpoint.trim_end_matches('/')
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}
