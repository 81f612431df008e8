//! # Configuration
//!
//! Runtime configuration loaded from environment variables.
//!
//! All configuration has sensible defaults and can be overridden via environment variables.

mod azure;
mod client;

pub use azure::{AzureAuthConfig, AzureConfig};
pub use client::ClientConfig;

/// Load configuration from environment variables with defaults
pub fn load_config() -> (ClientConfig, AzureConfig) {
    (ClientConfig::from_env(), AzureConfig::from_env())
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read a boolean flag: set to `1`, `true` or `yes` (any case) to enable
pub(crate) fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
