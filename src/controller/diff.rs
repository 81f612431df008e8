//! # Change Detection
//!
//! Field-level comparison of two default node pool configurations and the rules
//! deciding whether a change can be applied in place.
//!
//! Most settings of an agent pool are fixed once its nodes exist. Changing any of
//! them means the default pool has to be cycled: a temporary pool takes over the
//! system workloads while the default pool is deleted and recreated.

use crate::model::{DefaultNodePool, OsSku};
use std::collections::BTreeSet;
use std::fmt;

/// A user-facing attribute of the default node pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PoolField {
    Name,
    HostEncryptionEnabled,
    NodePublicIpEnabled,
    FipsEnabled,
    KubeletConfig,
    KubeletDiskType,
    LinuxOsConfig,
    MaxPods,
    OnlyCriticalAddonsEnabled,
    OsDiskSizeGb,
    OsDiskType,
    PodSubnetId,
    SnapshotId,
    UltraSsdEnabled,
    VnetSubnetId,
    VmSize,
    Zones,
    OsSku,
    NodeCount,
    AutoScalingEnabled,
    MinCount,
    MaxCount,
    OrchestratorVersion,
    NodeLabels,
    Tags,
    UpgradeSettings,
}

impl PoolField {
    /// Fields that can only change by recreating the pool
    pub const CYCLE_FIELDS: [PoolField; 17] = [
        PoolField::Name,
        PoolField::HostEncryptionEnabled,
        PoolField::NodePublicIpEnabled,
        PoolField::FipsEnabled,
        PoolField::KubeletConfig,
        PoolField::KubeletDiskType,
        PoolField::LinuxOsConfig,
        PoolField::MaxPods,
        PoolField::OnlyCriticalAddonsEnabled,
        PoolField::OsDiskSizeGb,
        PoolField::OsDiskType,
        PoolField::PodSubnetId,
        PoolField::SnapshotId,
        PoolField::UltraSsdEnabled,
        PoolField::VnetSubnetId,
        PoolField::VmSize,
        PoolField::Zones,
    ];

    /// Configuration attribute name
    pub fn attribute(self) -> &'static str {
        match self {
            PoolField::Name => "name",
            PoolField::HostEncryptionEnabled => "host_encryption_enabled",
            PoolField::NodePublicIpEnabled => "node_public_ip_enabled",
            PoolField::FipsEnabled => "fips_enabled",
            PoolField::KubeletConfig => "kubelet_config",
            PoolField::KubeletDiskType => "kubelet_disk_type",
            PoolField::LinuxOsConfig => "linux_os_config",
            PoolField::MaxPods => "max_pods",
            PoolField::OnlyCriticalAddonsEnabled => "only_critical_addons_enabled",
            PoolField::OsDiskSizeGb => "os_disk_size_gb",
            PoolField::OsDiskType => "os_disk_type",
            PoolField::PodSubnetId => "pod_subnet_id",
            PoolField::SnapshotId => "snapshot_id",
            PoolField::UltraSsdEnabled => "ultra_ssd_enabled",
            PoolField::VnetSubnetId => "vnet_subnet_id",
            PoolField::VmSize => "vm_size",
            PoolField::Zones => "zones",
            PoolField::OsSku => "os_sku",
            PoolField::NodeCount => "node_count",
            PoolField::AutoScalingEnabled => "auto_scaling_enabled",
            PoolField::MinCount => "min_count",
            PoolField::MaxCount => "max_count",
            PoolField::OrchestratorVersion => "orchestrator_version",
            PoolField::NodeLabels => "node_labels",
            PoolField::Tags => "tags",
            PoolField::UpgradeSettings => "upgrade_settings",
        }
    }

    /// Whether any change to this field forces a cycle
    ///
    /// `os_sku` is not listed: it depends on the transition, see
    /// [`os_sku_change_requires_cycle`].
    pub fn is_cycle_field(self) -> bool {
        Self::CYCLE_FIELDS.contains(&self)
    }
}

impl fmt::Display for PoolField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute())
    }
}

/// Fields that differ between a recorded and a desired configuration
///
/// `temporary_name_for_rotation` is bookkeeping and never counts as a change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePoolChanges {
    fields: BTreeSet<PoolField>,
    os_sku: Option<(Option<OsSku>, Option<OsSku>)>,
}

impl NodePoolChanges {
    pub fn between(prior: &DefaultNodePool, desired: &DefaultNodePool) -> Self {
        let mut changes = Self::default();
        let mut check = |field: PoolField, changed: bool| {
            if changed {
                changes.fields.insert(field);
            }
        };

        check(PoolField::Name, prior.name != desired.name);
        check(
            PoolField::HostEncryptionEnabled,
            prior.host_encryption_enabled != desired.host_encryption_enabled,
        );
        check(
            PoolField::NodePublicIpEnabled,
            prior.node_public_ip_enabled != desired.node_public_ip_enabled,
        );
        check(PoolField::FipsEnabled, prior.fips_enabled != desired.fips_enabled);
        check(PoolField::KubeletConfig, prior.kubelet_config != desired.kubelet_config);
        check(
            PoolField::KubeletDiskType,
            prior.kubelet_disk_type != desired.kubelet_disk_type,
        );
        check(PoolField::LinuxOsConfig, prior.linux_os_config != desired.linux_os_config);
        check(PoolField::MaxPods, prior.max_pods != desired.max_pods);
        check(
            PoolField::OnlyCriticalAddonsEnabled,
            prior.only_critical_addons_enabled != desired.only_critical_addons_enabled,
        );
        check(PoolField::OsDiskSizeGb, prior.os_disk_size_gb != desired.os_disk_size_gb);
        check(PoolField::OsDiskType, prior.os_disk_type != desired.os_disk_type);
        check(PoolField::PodSubnetId, prior.pod_subnet_id != desired.pod_subnet_id);
        check(PoolField::SnapshotId, prior.snapshot_id != desired.snapshot_id);
        check(PoolField::UltraSsdEnabled, prior.ultra_ssd_enabled != desired.ultra_ssd_enabled);
        check(PoolField::VnetSubnetId, prior.vnet_subnet_id != desired.vnet_subnet_id);
        check(PoolField::VmSize, prior.vm_size != desired.vm_size);
        check(PoolField::Zones, !same_zones(&prior.zones, &desired.zones));
        check(PoolField::OsSku, prior.os_sku != desired.os_sku);
        check(PoolField::NodeCount, prior.node_count != desired.node_count);
        check(
            PoolField::AutoScalingEnabled,
            prior.auto_scaling_enabled != desired.auto_scaling_enabled,
        );
        check(PoolField::MinCount, prior.min_count != desired.min_count);
        check(PoolField::MaxCount, prior.max_count != desired.max_count);
        check(
            PoolField::OrchestratorVersion,
            prior.orchestrator_version != desired.orchestrator_version,
        );
        check(PoolField::NodeLabels, prior.node_labels != desired.node_labels);
        check(PoolField::Tags, prior.tags != desired.tags);
        check(
            PoolField::UpgradeSettings,
            prior.upgrade_settings != desired.upgrade_settings,
        );

        if changes.fields.contains(&PoolField::OsSku) {
            changes.os_sku = Some((prior.os_sku.clone(), desired.os_sku.clone()));
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: PoolField) -> bool {
        self.fields.contains(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = PoolField> + '_ {
        self.fields.iter().copied()
    }

    /// Changed fields that force a cycle, including `os_sku` when its transition does
    pub fn cycle_fields(&self) -> Vec<PoolField> {
        self.fields()
            .filter(|field| match field {
                PoolField::OsSku => self.os_sku_requires_cycle(),
                field => field.is_cycle_field(),
            })
            .collect()
    }

    fn os_sku_requires_cycle(&self) -> bool {
        self.os_sku
            .as_ref()
            .is_some_and(|(old, new)| os_sku_change_requires_cycle(old.as_ref(), new.as_ref()))
    }
}

/// Whether applying `changes` requires cycling the default node pool
pub fn requires_cycle(changes: &NodePoolChanges) -> bool {
    changes.fields().any(PoolField::is_cycle_field) || changes.os_sku_requires_cycle()
}

/// Ubuntu and AzureLinux can replace each other in place; any transition involving
/// another SKU, including one this crate does not know, or an unset one, cannot
pub fn os_sku_change_requires_cycle(old: Option<&OsSku>, new: Option<&OsSku>) -> bool {
    if old == new {
        return false;
    }
    let in_place = |sku: Option<&OsSku>| sku.is_some_and(OsSku::is_in_place_upgradable);
    !in_place(old) || !in_place(new)
}

/// Whether renaming the default pool from `prior_name` to `desired_name` means
/// replacing the whole cluster
///
/// A recorded name equal to the temporary rotation name means a previous cycle
/// stopped after deleting the default pool. Renaming back resumes that cycle.
pub fn name_change_forces_replacement(
    prior_name: &str,
    desired_name: &str,
    temporary_name: Option<&str>,
) -> bool {
    if prior_name == desired_name {
        return false;
    }
    let resuming = !prior_name.is_empty() && temporary_name.is_some_and(|temp| temp == prior_name);
    !resuming
}

fn same_zones(a: &[String], b: &[String]) -> bool {
    let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}
