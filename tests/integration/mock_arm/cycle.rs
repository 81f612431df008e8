//! Default node pool updates and cycles driven through the REST client

use super::common::{recorded, updater};
use super::server::MockArm;
use node_pool_cycler::controller::{
    CycleError, CyclePhase, DefaultNodePoolState, PoolRole, UpdateError, UpdateOutcome,
};
use node_pool_cycler::model::DefaultNodePool;
use serde_json::json;

fn resized() -> DefaultNodePool {
    DefaultNodePool {
        vm_size: "Standard_D4s_v5".to_string(),
        ..recorded("default")
    }
}

#[tokio::test]
async fn test_vm_size_change_cycles_default_pool() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    let updater = updater(&arm);
    let mut state = DefaultNodePoolState::new("default");

    let outcome = updater
        .update(&mut state, &recorded("default"), &resized())
        .await
        .unwrap();

    let UpdateOutcome::Cycled(report) = outcome else {
        panic!("expected the default node pool to be cycled");
    };
    assert!(report.temporary_pool_created);
    assert!(report.default_pool_deleted);
    assert_eq!(
        arm.mutations(),
        vec![
            "PUT temp".to_string(),
            "DELETE default".to_string(),
            "PUT default".to_string(),
            "DELETE temp".to_string(),
        ]
    );
    assert_eq!(arm.pool_names(), vec!["default".to_string()]);
    assert_eq!(arm.pool_vm_size("default").as_deref(), Some("Standard_D4s_v5"));
    assert_eq!(state.phase, CyclePhase::Completed);
    assert_eq!(state.active_pool_name.as_deref(), Some("default"));
}

#[tokio::test]
async fn test_node_count_change_updates_in_place() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    let updater = updater(&arm);
    let mut state = DefaultNodePoolState::new("default");
    let desired = DefaultNodePool {
        node_count: Some(5),
        ..recorded("default")
    };

    let outcome = updater
        .update(&mut state, &recorded("default"), &desired)
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::UpdatedInPlace);
    assert_eq!(arm.mutations(), vec!["PUT default".to_string()]);
}

/// Only the attributes a user would write, leaving computed ones to the service
fn minimal(node_count: i32) -> DefaultNodePool {
    DefaultNodePool {
        name: "default".to_string(),
        vm_size: "Standard_D2s_v5".to_string(),
        node_count: Some(node_count),
        temporary_name_for_rotation: Some("temp".to_string()),
        ..DefaultNodePool::default()
    }
}

#[tokio::test]
async fn test_node_count_change_on_read_back_pool_updates_in_place() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    let updater = updater(&arm);
    let mut state = DefaultNodePoolState::default();

    let current = updater
        .read(&mut state, "default", Some("temp"))
        .await
        .unwrap()
        .expect("default pool should be found");
    let outcome = updater
        .update(&mut state, &current, &minimal(5))
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::UpdatedInPlace);
    assert_eq!(arm.mutations(), vec!["PUT default".to_string()]);
    assert_eq!(arm.pool_property("default", "count"), Some(json!(5)));
    assert_eq!(arm.pool_property("default", "maxPods"), Some(json!(110)));
    assert_eq!(arm.pool_property("default", "osDiskType"), Some(json!("Managed")));
}

#[tokio::test]
async fn test_leftover_temporary_pool_is_removed_on_next_run() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    arm.insert_pool("temp", "Standard_D2s_v5");
    let updater = updater(&arm);
    let mut state = DefaultNodePoolState::default();

    let current = updater
        .read(&mut state, "default", Some("temp"))
        .await
        .unwrap()
        .expect("default pool should be found");
    assert_eq!(state.phase, CyclePhase::DefaultPoolCreated);

    let outcome = updater
        .update(&mut state, &current, &minimal(3))
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::Unchanged);
    assert_eq!(arm.mutations(), vec!["DELETE temp".to_string()]);
    assert_eq!(arm.pool_names(), vec!["default".to_string()]);
    assert_eq!(state.phase, CyclePhase::Completed);
}

#[tokio::test]
async fn test_unsupported_orchestrator_version_is_rejected() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    let updater = updater(&arm);
    let mut state = DefaultNodePoolState::new("default");
    let desired = DefaultNodePool {
        orchestrator_version: Some("1.32.0".to_string()),
        ..recorded("default")
    };

    let err = updater
        .update(&mut state, &recorded("default"), &desired)
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::UnsupportedVersion { .. }));
    assert!(arm.mutations().is_empty());
}

#[tokio::test]
async fn test_failed_default_creation_leaves_temporary_pool() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    arm.fail_puts("default", 3);
    let updater = updater(&arm);
    let mut state = DefaultNodePoolState::new("default");

    let err = updater
        .update(&mut state, &recorded("default"), &resized())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UpdateError::Cycle(CycleError::Create {
            role: PoolRole::Default,
            ..
        })
    ));
    assert_eq!(arm.pool_names(), vec!["temp".to_string()]);
    assert_eq!(state.active_pool_name.as_deref(), Some("temp"));
    assert_eq!(state.phase, CyclePhase::DefaultPoolDeleted);
}

#[tokio::test]
async fn test_next_run_resumes_from_temporary_pool() {
    let arm = MockArm::start().await;
    arm.insert_pool("temp", "Standard_D4s_v5");
    let updater = updater(&arm);
    let mut state = DefaultNodePoolState::default();

    let current = updater
        .read(&mut state, "default", Some("temp"))
        .await
        .unwrap()
        .expect("temporary pool should be found");
    assert_eq!(current.name, "temp");
    assert!(state.is_temporary_pool_active());

    let outcome = updater
        .update(&mut state, &current, &resized())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        UpdateOutcome::Cycled(ref report)
            if !report.temporary_pool_created && !report.default_pool_deleted
    ));
    assert_eq!(
        arm.mutations(),
        vec!["PUT default".to_string(), "DELETE temp".to_string()]
    );
    assert_eq!(arm.pool_names(), vec!["default".to_string()]);
    assert_eq!(state.active_pool_name.as_deref(), Some("default"));
}

#[tokio::test]
async fn test_temporary_creation_failure_leaves_default_pool_untouched() {
    let arm = MockArm::start().await;
    arm.insert_pool("default", "Standard_D2s_v5");
    arm.fail_puts("temp", 3);
    let updater = updater(&arm);
    let mut state = DefaultNodePoolState::new("default");

    let err = updater
        .update(&mut state, &recorded("default"), &resized())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UpdateError::Cycle(CycleError::Create {
            role: PoolRole::Temporary,
            ..
        })
    ));
    assert_eq!(
        arm.mutations(),
        vec!["PUT temp".to_string(), "PUT temp".to_string(), "PUT temp".to_string()]
    );
    assert_eq!(arm.pool_names(), vec!["default".to_string()]);
}
