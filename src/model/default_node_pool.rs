//! # Default Node Pool Configuration
//!
//! Flat configuration model of a cluster's default node pool, as written by users
//! (`snake_case` attributes). Converted to [`AgentPool`](super::AgentPool) by
//! [`expand_default_node_pool`](super::expand_default_node_pool).

use super::agent_pool::{KubeletDiskType, OsDiskType, OsSku};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired (or recorded) settings of the default node pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultNodePool {
    pub name: String,
    pub vm_size: String,
    /// Pool name used while the default pool is being cycled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary_name_for_rotation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_count: Option<i32>,
    #[serde(default)]
    pub auto_scaling_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pods: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_disk_size_gb: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_disk_type: Option<OsDiskType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubelet_disk_type: Option<KubeletDiskType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_sku: Option<OsSku>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnet_subnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_subnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<String>,

    #[serde(default)]
    pub host_encryption_enabled: bool,
    #[serde(default)]
    pub node_public_ip_enabled: bool,
    #[serde(default)]
    pub fips_enabled: bool,
    #[serde(default)]
    pub ultra_ssd_enabled: bool,
    #[serde(default)]
    pub only_critical_addons_enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator_version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubelet_config: Option<KubeletConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux_os_config: Option<LinuxOsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_settings: Option<UpgradeSettings>,
}

impl DefaultNodePool {
    /// Temporary rotation name, treating an empty string as unset
    pub fn temporary_name(&self) -> Option<&str> {
        self.temporary_name_for_rotation
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Fill the attributes Resource Manager computes when they are left unset
    /// (`node_count`, `max_pods`, OS disk and SKU, orchestrator version, upgrade
    /// settings) with their values in `current`
    ///
    /// An unset computed attribute means "keep what the pool has", so it neither
    /// shows up as a change nor resets the pool on the next `PUT`.
    #[must_use]
    pub fn inherit_computed(&self, current: &DefaultNodePool) -> DefaultNodePool {
        fn keep<T: Clone>(desired: &Option<T>, current: &Option<T>) -> Option<T> {
            desired.clone().or_else(|| current.clone())
        }

        DefaultNodePool {
            node_count: keep(&self.node_count, &current.node_count),
            max_pods: keep(&self.max_pods, &current.max_pods),
            os_disk_size_gb: keep(&self.os_disk_size_gb, &current.os_disk_size_gb),
            os_disk_type: keep(&self.os_disk_type, &current.os_disk_type),
            kubelet_disk_type: keep(&self.kubelet_disk_type, &current.kubelet_disk_type),
            os_sku: keep(&self.os_sku, &current.os_sku),
            orchestrator_version: keep(&self.orchestrator_version, &current.orchestrator_version),
            upgrade_settings: keep(&self.upgrade_settings, &current.upgrade_settings),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KubeletConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_manager_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_cfs_quota_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_cfs_quota_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_gc_high_threshold: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_gc_low_threshold: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology_manager_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_unsafe_sysctls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_log_max_size_mb: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_log_max_line: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_max_pid: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinuxOsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_file_size_mb: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent_huge_page_enabled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent_huge_page_defrag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sysctl_config: Option<SysctlConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SysctlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_core_somaxconn: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_max_map_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_file_max: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeSettings {
    pub max_surge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drain_timeout_in_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_soak_duration_in_minutes: Option<i32>,
}
