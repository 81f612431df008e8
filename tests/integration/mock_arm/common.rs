//! Shared setup for mock server tests

use super::server::MockArm;
use node_pool_cycler::config::{AzureConfig, ClientConfig};
use node_pool_cycler::controller::DefaultNodePoolUpdater;
use node_pool_cycler::model::{ClusterId, DefaultNodePool, OsSku};
use node_pool_cycler::provider::azure::{create_agent_pool_client, AzureAgentPools};
use std::sync::Arc;

pub fn cluster() -> ClusterId {
    ClusterId::new("00000000-0000-0000-0000-000000000000", "rg-aks", "prod")
}

/// Client pointed at `arm` with a mock credential and fast polling
pub fn client(arm: &MockArm) -> AzureAgentPools {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = ClientConfig {
        arm_endpoint: format!("{}/", arm.base_url()),
        poll_interval_ms: 5,
        operation_timeout_secs: 10,
        mock_mode: true,
        ..ClientConfig::default()
    };
    create_agent_pool_client(&config, &AzureConfig::default())
        .expect("Failed to create agent pool client")
}

pub fn updater(arm: &MockArm) -> DefaultNodePoolUpdater {
    DefaultNodePoolUpdater::new(Arc::new(client(arm)), cluster())
}

/// Configuration matching a pool seeded with `MockArm::insert_pool(name, "Standard_D2s_v5")`
pub fn recorded(name: &str) -> DefaultNodePool {
    DefaultNodePool {
        name: name.to_string(),
        vm_size: "Standard_D2s_v5".to_string(),
        node_count: Some(3),
        os_sku: Some(OsSku::Ubuntu),
        orchestrator_version: Some("1.30.3".to_string()),
        temporary_name_for_rotation: Some("temp".to_string()),
        ..DefaultNodePool::default()
    }
}
