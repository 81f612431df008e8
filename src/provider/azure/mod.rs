//! # Azure Provider
//!
//! Azure Resource Manager implementation of the agent pool API.

pub mod agent_pools;
pub mod auth;
mod lro;
pub mod types;

pub use agent_pools::AzureAgentPools;

use crate::config::{AzureConfig, ClientConfig};
use anyhow::Result;
use tracing::info;

/// Build an agent pool client from configuration
///
/// In mock mode the client authenticates with [`auth::MockTokenCredential`] and talks to
/// whatever `AZURE_ARM_ENDPOINT` points at.
pub fn create_agent_pool_client(
    config: &ClientConfig,
    azure: &AzureConfig,
) -> Result<AzureAgentPools> {
    if config.mock_mode {
        info!("Mock mode: routing Resource Manager requests to {}", config.endpoint());
    }
    let credential = auth::create_credential(azure, config.mock_mode)?;
    AzureAgentPools::new(config, credential)
}
