//! # Initialization
//!
//! Start-up logic for `poolctl`: rustls setup, tracing, metrics and configuration.

use crate::config::{load_config, AzureConfig, ClientConfig};
use crate::constants::DEFAULT_LOG_FILTER;
use crate::observability;
use anyhow::Result;
use tracing::{debug, info};

/// Everything a command needs once the process is set up
#[derive(Debug, Clone)]
pub struct InitializationResult {
    /// Resource Manager client configuration
    pub client_config: ClientConfig,
    /// Azure authentication configuration
    pub azure_config: AzureConfig,
}

/// Initialize the process
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup (logs go to stderr, command output to stdout)
/// - Metrics registration
/// - Configuration loading
pub fn initialize() -> Result<InitializationResult> {
    // Configure rustls crypto provider FIRST, before any client is built
    // Required for rustls 0.23+ when no default provider is set via features
    let provider_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))?;

    if !provider_installed {
        debug!("rustls crypto provider was already installed");
    }

    observability::metrics::register_metrics()?;

    let (client_config, azure_config) = load_config();
    info!(
        "Resource Manager endpoint: {}, API version: {}",
        client_config.endpoint(),
        client_config.api_version
    );
    if client_config.mock_mode {
        info!("Mock mode enabled: using mock Azure credential");
    }

    Ok(InitializationResult {
        client_config,
        azure_config,
    })
}
