//! # Default Node Pool Updater
//!
//! Applies a change of the default node pool configuration: nothing to do, an in-place
//! `PUT`, or a full cycle through [`NodePoolCycleCoordinator`].
//!
//! Also owns the read side: after a failed cycle the default pool may be gone while the
//! temporary pool carries the system workloads, so reads fall back to the temporary pool.
//! A temporary pool that outlived a finished cycle is removed by the next update.

use super::cycle::{CycleReport, NodePoolCycleCoordinator};
use super::diff::{name_change_forces_replacement, requires_cycle, NodePoolChanges, PoolField};
use super::error::{CycleError, UpdateError};
use super::state::{CyclePhase, DefaultNodePoolState};
use super::version::validate_node_pool_version;
use crate::model::{
    expand_default_node_pool, flatten_agent_pool, validate_rotation_names, AgentPool, ClusterId,
    DefaultNodePool,
};
use crate::observability::metrics;
use crate::provider::AgentPoolApi;
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};

/// What an update will do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedAction {
    None,
    UpdateInPlace,
    Cycle,
}

/// Result of comparing a recorded and a desired configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub changes: NodePoolChanges,
    pub action: PlannedAction,
}

/// Outcome of [`DefaultNodePoolUpdater::update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Unchanged,
    UpdatedInPlace,
    Cycled(CycleReport),
}

impl UpdateOutcome {
    fn metric_label(&self) -> &'static str {
        match self {
            UpdateOutcome::Unchanged => "unchanged",
            UpdateOutcome::UpdatedInPlace => "in_place",
            UpdateOutcome::Cycled(_) => "cycled",
        }
    }
}

/// Decide how `desired` can be reached from `prior` without touching any API
///
/// Computed attributes left unset in `desired` keep their values from `prior`
/// (see [`DefaultNodePool::inherit_computed`]).
///
/// # Errors
/// - [`UpdateError::ReplacementRequired`] for a rename that is not a resumed cycle
/// - [`CycleError::MissingTemporaryName`] / [`CycleError::InvalidTemporaryName`] when a
///   cycle is needed but no usable temporary name is configured
/// - [`UpdateError::Expand`] when `desired` is not a valid pool configuration
pub fn plan_update(
    prior: &DefaultNodePool,
    desired: &DefaultNodePool,
) -> Result<UpdatePlan, UpdateError> {
    let desired = &desired.inherit_computed(prior);
    let changes = NodePoolChanges::between(prior, desired);

    if changes.contains(PoolField::Name)
        && name_change_forces_replacement(&prior.name, &desired.name, desired.temporary_name())
    {
        return Err(UpdateError::ReplacementRequired {
            from: prior.name.clone(),
            to: desired.name.clone(),
        });
    }

    if changes.is_empty() {
        return Ok(UpdatePlan {
            changes,
            action: PlannedAction::None,
        });
    }

    expand_default_node_pool(desired)?;

    let action = if requires_cycle(&changes) {
        let Some(temporary_name) = desired.temporary_name() else {
            return Err(CycleError::MissingTemporaryName {
                changed: changes.cycle_fields(),
            }
            .into());
        };
        validate_rotation_names(&desired.name, temporary_name).map_err(CycleError::from)?;
        PlannedAction::Cycle
    } else {
        PlannedAction::UpdateInPlace
    };

    Ok(UpdatePlan { changes, action })
}

/// Reconciles the default node pool of one cluster
pub struct DefaultNodePoolUpdater {
    api: Arc<dyn AgentPoolApi>,
    cluster: ClusterId,
    coordinator: NodePoolCycleCoordinator,
}

impl std::fmt::Debug for DefaultNodePoolUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultNodePoolUpdater")
            .field("cluster", &self.cluster)
            .finish_non_exhaustive()
    }
}

impl DefaultNodePoolUpdater {
    pub fn new(api: Arc<dyn AgentPoolApi>, cluster: ClusterId) -> Self {
        let coordinator = NodePoolCycleCoordinator::new(api.clone(), cluster.clone());
        Self {
            api,
            cluster,
            coordinator,
        }
    }

    pub fn cluster(&self) -> &ClusterId {
        &self.cluster
    }

    /// Move the default node pool from `prior` to `desired`
    ///
    /// # Errors
    /// See [`plan_update`] for planning failures; API failures are reported as
    /// [`UpdateError::InPlace`] or through [`CycleError`].
    pub async fn update(
        &self,
        state: &mut DefaultNodePoolState,
        prior: &DefaultNodePool,
        desired: &DefaultNodePool,
    ) -> Result<UpdateOutcome, UpdateError> {
        let span = info_span!(
            "default_node_pool.update",
            cluster.name = %self.cluster.managed_cluster_name,
            pool.name = %desired.name
        );

        let result = self.apply(state, prior, desired).instrument(span).await;
        match &result {
            Ok(outcome) => metrics::increment_default_pool_updates(outcome.metric_label()),
            Err(_) => metrics::increment_default_pool_updates("failed"),
        }
        result
    }

    async fn apply(
        &self,
        state: &mut DefaultNodePoolState,
        prior: &DefaultNodePool,
        desired: &DefaultNodePool,
    ) -> Result<UpdateOutcome, UpdateError> {
        let requested = desired;
        let desired = &requested.inherit_computed(prior);
        let plan = plan_update(prior, desired)?;
        debug!(
            "Changed default node pool fields: {:?}",
            plan.changes.fields().map(PoolField::attribute).collect::<Vec<_>>()
        );

        if plan.action != PlannedAction::Cycle {
            self.coordinator
                .remove_leftover_temporary_pool(state, &desired.name)
                .await?;
        }
        if plan.action != PlannedAction::None {
            self.check_orchestrator_version(prior, requested).await?;
        }

        match plan.action {
            PlannedAction::None => {
                info!("Default node pool {} is up to date", desired.name);
                Ok(UpdateOutcome::Unchanged)
            }
            PlannedAction::UpdateInPlace => {
                info!("Updating default node pool {} in place", desired.name);
                let payload = expand_default_node_pool(desired)?;
                let id = self.cluster.agent_pool(&desired.name);
                self.api
                    .create_or_update_then_poll(&id, &payload)
                    .await
                    .map_err(|source| UpdateError::InPlace {
                        pool: id.clone(),
                        source,
                    })?;
                state.active_pool_name = Some(desired.name.clone());
                state.temporary_name_for_rotation =
                    desired.temporary_name().map(str::to_string);
                state.transition(CyclePhase::Idle);
                Ok(UpdateOutcome::UpdatedInPlace)
            }
            PlannedAction::Cycle => {
                info!(
                    "Default node pool {} must be cycled to apply: {:?}",
                    desired.name,
                    plan.changes
                        .cycle_fields()
                        .into_iter()
                        .map(PoolField::attribute)
                        .collect::<Vec<_>>()
                );
                let report = self
                    .coordinator
                    .execute(state, desired, desired.temporary_name())
                    .await?;
                Ok(UpdateOutcome::Cycled(report))
            }
        }
    }

    /// Reject an explicitly requested orchestrator version the cluster does not offer
    async fn check_orchestrator_version(
        &self,
        prior: &DefaultNodePool,
        requested: &DefaultNodePool,
    ) -> Result<(), UpdateError> {
        let Some(version) = requested.orchestrator_version.as_deref() else {
            return Ok(());
        };
        let current = prior.orchestrator_version.as_deref();
        if current == Some(version) {
            return Ok(());
        }

        let available = self
            .api
            .available_versions(&self.cluster)
            .await
            .map_err(|source| UpdateError::VersionLookup {
                cluster: self.cluster.clone(),
                source,
            })?;
        debug!("Available agent pool versions: {:?}", available);
        validate_node_pool_version(current, version, &available)
    }

    /// Pool currently serving as the default pool
    ///
    /// The default pool if it exists, else the temporary pool if one is configured and
    /// exists (a cycle failed after deleting the default pool), else `None`.
    pub async fn resolve_active_pool(
        &self,
        default_name: &str,
        temporary_name: Option<&str>,
    ) -> Result<Option<AgentPool>> {
        let default_id = self.cluster.agent_pool(default_name);
        if let Some(pool) = self
            .api
            .get(&default_id)
            .await
            .with_context(|| format!("retrieving default node pool {default_id}"))?
        {
            return Ok(Some(pool));
        }

        let Some(temporary_name) = temporary_name.map(str::trim).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };
        let temporary_id = self.cluster.agent_pool(temporary_name);
        let pool = self
            .api
            .get(&temporary_id)
            .await
            .with_context(|| format!("retrieving temporary node pool {temporary_id}"))?;
        if pool.is_some() {
            info!(
                "Default node pool {} not found, falling back to temporary node pool {}",
                default_name, temporary_name
            );
        }
        Ok(pool)
    }

    /// Read the active pool back into configuration and record it in `state`
    ///
    /// When the temporary pool is active the returned configuration carries its name,
    /// which makes the next update resume the interrupted cycle. When the default pool
    /// is back but the temporary pool still exists, `state` is moved to
    /// [`CyclePhase::DefaultPoolCreated`] so the next update removes it.
    pub async fn read(
        &self,
        state: &mut DefaultNodePoolState,
        default_name: &str,
        temporary_name: Option<&str>,
    ) -> Result<Option<DefaultNodePool>> {
        let Some(pool) = self.resolve_active_pool(default_name, temporary_name).await? else {
            return Ok(None);
        };

        let mut current = flatten_agent_pool(&pool);
        if current.name.is_empty() {
            current.name = default_name.to_string();
        }
        current.temporary_name_for_rotation = temporary_name.map(str::to_string);

        state.temporary_name_for_rotation = temporary_name.map(str::to_string);
        if current.name != default_name {
            if !state.is_cycle_in_progress() {
                state.transition(CyclePhase::DefaultPoolDeleted);
            }
        } else if !state.is_cycle_in_progress() {
            self.detect_leftover_temporary_pool(state, default_name, temporary_name)
                .await?;
        }
        state.active_pool_name = Some(current.name.clone());

        Ok(Some(current))
    }

    async fn detect_leftover_temporary_pool(
        &self,
        state: &mut DefaultNodePoolState,
        default_name: &str,
        temporary_name: Option<&str>,
    ) -> Result<()> {
        let Some(temporary_name) = temporary_name
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != default_name)
        else {
            return Ok(());
        };
        let temporary_id = self.cluster.agent_pool(temporary_name);
        let leftover = self
            .api
            .get(&temporary_id)
            .await
            .with_context(|| format!("retrieving temporary node pool {temporary_id}"))?;
        if leftover.is_some() {
            info!(
                "Temporary node pool {} still exists next to default node pool {}",
                temporary_name, default_name
            );
            state.transition(CyclePhase::DefaultPoolCreated);
        }
        Ok(())
    }
}
