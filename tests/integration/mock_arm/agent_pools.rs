//! REST client tests: reads, long-running operations and error bodies

use super::common::{client, cluster, recorded};
use super::server::MockArm;
use node_pool_cycler::model::expand_default_node_pool;
use node_pool_cycler::provider::AgentPoolApi;

#[tokio::test]
async fn test_get_missing_pool_returns_none() {
    let arm = MockArm::start().await;
    let client = client(&arm);

    let pool = client.get(&cluster().agent_pool("missing")).await.unwrap();

    assert!(pool.is_none());
    assert_eq!(arm.requests(), vec!["GET missing".to_string()]);
}

#[tokio::test]
async fn test_get_existing_pool() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    let client = client(&arm);

    let pool = client
        .get(&cluster().agent_pool("default"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(pool.name.as_deref(), Some("default"));
    assert_eq!(pool.provisioning_state(), Some("Succeeded"));
    assert_eq!(pool.properties.vm_size.as_deref(), Some("Standard_D2s_v5"));
    assert_eq!(pool.properties.max_pods, Some(110));
    assert_eq!(pool.properties.os_disk_size_gb, Some(128));
}

#[tokio::test]
async fn test_available_versions() {
    let arm = MockArm::start().await;
    arm.set_versions(&["1.30.3", "1.31.1"]);
    let client = client(&arm);

    let versions = client.available_versions(&cluster()).await.unwrap();

    assert_eq!(versions, vec!["1.30.3".to_string(), "1.31.1".to_string()]);
    assert_eq!(arm.requests(), vec!["GET availableAgentPoolVersions".to_string()]);
}

#[tokio::test]
async fn test_create_follows_async_operation() {
    let arm = MockArm::start().await;
    let client = client(&arm);
    let payload = expand_default_node_pool(&recorded("temp")).unwrap();

    client
        .create_or_update_then_poll(&cluster().agent_pool("temp"), &payload)
        .await
        .unwrap();

    assert_eq!(arm.pool_names(), vec!["temp".to_string()]);
    assert_eq!(arm.pool_vm_size("temp").as_deref(), Some("Standard_D2s_v5"));
}

#[tokio::test]
async fn test_failed_operation_surfaces_service_message() {
    let arm = MockArm::start().await;
    arm.fail_puts("temp", 1);
    let client = client(&arm);
    let payload = expand_default_node_pool(&recorded("temp")).unwrap();

    let err = client
        .create_or_update_then_poll(&cluster().agent_pool("temp"), &payload)
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Failed"), "{message}");
    assert!(
        message.contains("AllocationFailed: Allocation failed."),
        "{message}"
    );
    assert!(arm.pool_names().is_empty());
}

#[tokio::test]
async fn test_update_polls_resource_provisioning_state() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    let client = client(&arm);
    let mut desired = recorded("default");
    desired.node_count = Some(5);
    let payload = expand_default_node_pool(&desired).unwrap();

    client
        .create_or_update_then_poll(&cluster().agent_pool("default"), &payload)
        .await
        .unwrap();

    // One poll still reports Updating, the next one Succeeded
    assert_eq!(
        arm.requests(),
        vec![
            "PUT default".to_string(),
            "GET default".to_string(),
            "GET default".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_delete_follows_location_and_tolerates_absent_pool() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    let client = client(&arm);
    let id = cluster().agent_pool("default");

    client.delete_then_poll(&id).await.unwrap();
    assert!(arm.pool_names().is_empty());

    client.delete_then_poll(&id).await.unwrap();
    assert_eq!(
        arm.mutations(),
        vec!["DELETE default".to_string(), "DELETE default".to_string()]
    );
}

#[tokio::test]
async fn test_delete_conflict_reports_resource_manager_error() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    arm.conflict_deletes("default");
    let client = client(&arm);

    let err = client
        .delete_then_poll(&cluster().agent_pool("default"))
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("409"), "{message}");
    assert!(
        message.contains("OperationNotAllowed: The agent pool cannot be deleted"),
        "{message}"
    );
    assert_eq!(arm.pool_names(), vec!["default".to_string()]);
}
