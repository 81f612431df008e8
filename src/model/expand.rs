//! # Expand / Flatten
//!
//! Converts between the flat [`DefaultNodePool`] configuration model and the
//! nested [`AgentPool`] payload understood by Resource Manager.

use super::agent_pool::{
    AgentPool, AgentPoolMode, AgentPoolProperties, CreationData, KubeletConfigPayload,
    LinuxOsConfigPayload, SysctlConfigPayload, UpgradeSettingsPayload,
};
use super::default_node_pool::{
    DefaultNodePool, KubeletConfig, LinuxOsConfig, SysctlConfig, UpgradeSettings,
};
use super::validation::{validate_agent_pool_name, InvalidPoolName};
use crate::constants::CRITICAL_ADDONS_ONLY_TAINT;
use std::collections::BTreeMap;
use thiserror::Error;

const DEFAULT_POOL_OS_TYPE: &str = "Linux";
const DEFAULT_POOL_TYPE: &str = "VirtualMachineScaleSets";

/// Configuration that cannot be turned into a valid agent pool payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error(transparent)]
    InvalidName(#[from] InvalidPoolName),
    #[error("`min_count` and `max_count` must be set when `auto_scaling_enabled` is true")]
    MissingAutoscalingBounds,
    #[error("`min_count` and `max_count` can only be set when `auto_scaling_enabled` is true")]
    AutoscalingBoundsWithoutAutoscaling,
    #[error("`max_count` ({max}) must be greater than or equal to `min_count` ({min})")]
    InvertedAutoscalingBounds { min: i32, max: i32 },
    #[error("`node_count` ({count}) must be between `min_count` ({min}) and `max_count` ({max})")]
    NodeCountOutOfBounds { count: i32, min: i32, max: i32 },
}

/// Build the agent pool payload for the default node pool
///
/// The payload is named after `pool.name`; use [`AgentPool::renamed`] for the temporary pool.
pub fn expand_default_node_pool(pool: &DefaultNodePool) -> Result<AgentPool, ExpandError> {
    validate_agent_pool_name(&pool.name)?;
    validate_scaling(pool)?;

    let properties = AgentPoolProperties {
        count: pool.node_count,
        vm_size: Some(pool.vm_size.clone()),
        os_disk_size_gb: pool.os_disk_size_gb,
        os_disk_type: pool.os_disk_type.clone(),
        kubelet_disk_type: pool.kubelet_disk_type.clone(),
        os_type: Some(DEFAULT_POOL_OS_TYPE.to_string()),
        os_sku: pool.os_sku.clone(),
        vnet_subnet_id: pool.vnet_subnet_id.clone(),
        pod_subnet_id: pool.pod_subnet_id.clone(),
        max_pods: pool.max_pods,
        enable_auto_scaling: Some(pool.auto_scaling_enabled),
        min_count: pool.min_count,
        max_count: pool.max_count,
        availability_zones: non_empty(pool.zones.clone()),
        enable_node_public_ip: Some(pool.node_public_ip_enabled),
        enable_encryption_at_host: Some(pool.host_encryption_enabled),
        enable_fips: Some(pool.fips_enabled),
        enable_ultra_ssd: Some(pool.ultra_ssd_enabled),
        mode: Some(AgentPoolMode::System),
        pool_type: Some(DEFAULT_POOL_TYPE.to_string()),
        orchestrator_version: pool.orchestrator_version.clone(),
        current_orchestrator_version: None,
        node_labels: non_empty_map(pool.node_labels.clone()),
        node_taints: pool
            .only_critical_addons_enabled
            .then(|| vec![CRITICAL_ADDONS_ONLY_TAINT.to_string()]),
        tags: non_empty_map(pool.tags.clone()),
        kubelet_config: pool.kubelet_config.as_ref().map(expand_kubelet_config),
        linux_os_config: pool.linux_os_config.as_ref().map(expand_linux_os_config),
        upgrade_settings: pool.upgrade_settings.as_ref().map(expand_upgrade_settings),
        creation_data: pool.snapshot_id.as_ref().map(|id| CreationData {
            source_resource_id: Some(id.clone()),
        }),
        provisioning_state: None,
    };

    Ok(AgentPool {
        id: None,
        name: Some(pool.name.clone()),
        properties,
    })
}

/// Read an agent pool back into the configuration model
///
/// `temporary_name_for_rotation` only lives in configuration, so it is left unset.
pub fn flatten_agent_pool(pool: &AgentPool) -> DefaultNodePool {
    let props = &pool.properties;
    let node_taints = props.node_taints.clone().unwrap_or_default();

    DefaultNodePool {
        name: pool.name.clone().unwrap_or_default(),
        vm_size: props.vm_size.clone().unwrap_or_default(),
        temporary_name_for_rotation: None,
        node_count: props.count,
        auto_scaling_enabled: props.enable_auto_scaling.unwrap_or(false),
        min_count: props.min_count,
        max_count: props.max_count,
        max_pods: props.max_pods,
        os_disk_size_gb: props.os_disk_size_gb,
        os_disk_type: props.os_disk_type.clone(),
        kubelet_disk_type: props.kubelet_disk_type.clone(),
        os_sku: props.os_sku.clone(),
        vnet_subnet_id: props.vnet_subnet_id.clone(),
        pod_subnet_id: props.pod_subnet_id.clone(),
        zones: props.availability_zones.clone().unwrap_or_default(),
        host_encryption_enabled: props.enable_encryption_at_host.unwrap_or(false),
        node_public_ip_enabled: props.enable_node_public_ip.unwrap_or(false),
        fips_enabled: props.enable_fips.unwrap_or(false),
        ultra_ssd_enabled: props.enable_ultra_ssd.unwrap_or(false),
        only_critical_addons_enabled: node_taints
            .iter()
            .any(|taint| taint.eq_ignore_ascii_case(CRITICAL_ADDONS_ONLY_TAINT)),
        snapshot_id: props
            .creation_data
            .as_ref()
            .and_then(|data| data.source_resource_id.clone()),
        orchestrator_version: props
            .orchestrator_version
            .clone()
            .or_else(|| props.current_orchestrator_version.clone()),
        node_labels: props.node_labels.clone().unwrap_or_default(),
        tags: props.tags.clone().unwrap_or_default(),
        kubelet_config: props.kubelet_config.as_ref().map(flatten_kubelet_config),
        linux_os_config: props.linux_os_config.as_ref().map(flatten_linux_os_config),
        upgrade_settings: props.upgrade_settings.as_ref().map(flatten_upgrade_settings),
    }
}

fn validate_scaling(pool: &DefaultNodePool) -> Result<(), ExpandError> {
    if !pool.auto_scaling_enabled {
        if pool.min_count.is_some() || pool.max_count.is_some() {
            return Err(ExpandError::AutoscalingBoundsWithoutAutoscaling);
        }
        return Ok(());
    }

    let (Some(min), Some(max)) = (pool.min_count, pool.max_count) else {
        return Err(ExpandError::MissingAutoscalingBounds);
    };
    if min > max {
        return Err(ExpandError::InvertedAutoscalingBounds { min, max });
    }
    if let Some(count) = pool.node_count {
        if count < min || count > max {
            return Err(ExpandError::NodeCountOutOfBounds { count, min, max });
        }
    }
    Ok(())
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

fn non_empty_map(values: BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    (!values.is_empty()).then_some(values)
}

fn expand_kubelet_config(config: &KubeletConfig) -> KubeletConfigPayload {
    KubeletConfigPayload {
        cpu_manager_policy: config.cpu_manager_policy.clone(),
        cpu_cfs_quota: config.cpu_cfs_quota_enabled,
        cpu_cfs_quota_period: config.cpu_cfs_quota_period.clone(),
        image_gc_high_threshold: config.image_gc_high_threshold,
        image_gc_low_threshold: config.image_gc_low_threshold,
        topology_manager_policy: config.topology_manager_policy.clone(),
        allowed_unsafe_sysctls: non_empty(config.allowed_unsafe_sysctls.clone()),
        container_log_max_size_mb: config.container_log_max_size_mb,
        container_log_max_files: config.container_log_max_line,
        pod_max_pids: config.pod_max_pid,
    }
}

fn flatten_kubelet_config(payload: &KubeletConfigPayload) -> KubeletConfig {
    KubeletConfig {
        cpu_manager_policy: payload.cpu_manager_policy.clone(),
        cpu_cfs_quota_enabled: payload.cpu_cfs_quota,
        cpu_cfs_quota_period: payload.cpu_cfs_quota_period.clone(),
        image_gc_high_threshold: payload.image_gc_high_threshold,
        image_gc_low_threshold: payload.image_gc_low_threshold,
        topology_manager_policy: payload.topology_manager_policy.clone(),
        allowed_unsafe_sysctls: payload.allowed_unsafe_sysctls.clone().unwrap_or_default(),
        container_log_max_size_mb: payload.container_log_max_size_mb,
        container_log_max_line: payload.container_log_max_files,
        pod_max_pid: payload.pod_max_pids,
    }
}

fn expand_linux_os_config(config: &LinuxOsConfig) -> LinuxOsConfigPayload {
    LinuxOsConfigPayload {
        swap_file_size_mb: config.swap_file_size_mb,
        transparent_huge_page_enabled: config.transparent_huge_page_enabled.clone(),
        transparent_huge_page_defrag: config.transparent_huge_page_defrag.clone(),
        sysctls: config.sysctl_config.as_ref().map(|sysctl| SysctlConfigPayload {
            net_core_somaxconn: sysctl.net_core_somaxconn,
            vm_max_map_count: sysctl.vm_max_map_count,
            fs_file_max: sysctl.fs_file_max,
        }),
    }
}

fn flatten_linux_os_config(payload: &LinuxOsConfigPayload) -> LinuxOsConfig {
    LinuxOsConfig {
        swap_file_size_mb: payload.swap_file_size_mb,
        transparent_huge_page_enabled: payload.transparent_huge_page_enabled.clone(),
        transparent_huge_page_defrag: payload.transparent_huge_page_defrag.clone(),
        sysctl_config: payload.sysctls.as_ref().map(|sysctl| SysctlConfig {
            net_core_somaxconn: sysctl.net_core_somaxconn,
            vm_max_map_count: sysctl.vm_max_map_count,
            fs_file_max: sysctl.fs_file_max,
        }),
    }
}

fn expand_upgrade_settings(settings: &UpgradeSettings) -> UpgradeSettingsPayload {
    UpgradeSettingsPayload {
        max_surge: Some(settings.max_surge.clone()),
        drain_timeout_in_minutes: settings.drain_timeout_in_minutes,
        node_soak_duration_in_minutes: settings.node_soak_duration_in_minutes,
    }
}

fn flatten_upgrade_settings(payload: &UpgradeSettingsPayload) -> UpgradeSettings {
    UpgradeSettings {
        max_surge: payload.max_surge.clone().unwrap_or_default(),
        drain_timeout_in_minutes: payload.drain_timeout_in_minutes,
        node_soak_duration_in_minutes: payload.node_soak_duration_in_minutes,
    }
}
