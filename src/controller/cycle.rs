//! # Node Pool Cycle Coordinator
//!
//! Replaces the default node pool when a change cannot be applied in place:
//!
//! 1. Ensure the temporary pool exists (created with the desired settings)
//! 2. Delete the default pool
//! 3. Recreate the default pool under its own name with the desired settings
//! 4. Delete the temporary pool
//!
//! Every step tolerates the result of a previous, partially failed run: an existing
//! temporary pool is reused and an already deleted default pool is not deleted
//! again. Until the default pool has been recreated the temporary pool is never
//! removed, so the cluster always keeps a system pool.

use super::diff::{self, NodePoolChanges};
use super::error::{error_chain, CycleError, PoolRole};
use super::state::{CyclePhase, DefaultNodePoolState};
use crate::constants::NODE_POOL_CREATE_ATTEMPTS;
use crate::model::{
    expand_default_node_pool, validate_rotation_names, AgentPoolId, ClusterId, DefaultNodePool,
};
use crate::observability::metrics;
use crate::provider::AgentPoolApi;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Summary of a finished cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// False when a temporary pool left by an earlier run was reused
    pub temporary_pool_created: bool,
    /// False when the default pool was already gone
    pub default_pool_deleted: bool,
    pub active_pool_name: String,
}

/// Drives the default node pool cycle against an [`AgentPoolApi`]
pub struct NodePoolCycleCoordinator {
    api: Arc<dyn AgentPoolApi>,
    cluster: ClusterId,
}

impl fmt::Debug for NodePoolCycleCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePoolCycleCoordinator")
            .field("cluster", &self.cluster)
            .finish_non_exhaustive()
    }
}

impl NodePoolCycleCoordinator {
    pub fn new(api: Arc<dyn AgentPoolApi>, cluster: ClusterId) -> Self {
        Self { api, cluster }
    }

    /// Whether `changes` can only be applied by cycling the default pool
    pub fn requires_cycle(changes: &NodePoolChanges) -> bool {
        diff::requires_cycle(changes)
    }

    /// Cycle the default node pool into `desired` using `temporary_name` as the stand-in pool
    ///
    /// `state` reflects the progress made even when an error is returned. When the
    /// default pool cannot be recreated, the temporary pool stays in place and
    /// `state.active_pool_name` names it.
    ///
    /// # Errors
    /// Returns [`CycleError`] for a missing or invalid temporary name, an invalid
    /// desired configuration, or the first failed API step.
    pub async fn execute(
        &self,
        state: &mut DefaultNodePoolState,
        desired: &DefaultNodePool,
        temporary_name: Option<&str>,
    ) -> Result<CycleReport, CycleError> {
        let span = info_span!(
            "default_node_pool.cycle",
            cluster.name = %self.cluster.managed_cluster_name,
            pool.name = %desired.name,
            temporary.name = temporary_name.unwrap_or_default()
        );

        let result = self
            .run(state, desired, temporary_name)
            .instrument(span)
            .await;

        match &result {
            Ok(report) => {
                metrics::increment_cycles_completed();
                info!(
                    "Cycled default node pool {} (temporary pool created: {}, default pool deleted: {})",
                    report.active_pool_name, report.temporary_pool_created, report.default_pool_deleted
                );
            }
            Err(e) => {
                metrics::increment_cycle_failures(e.stage());
                error!(
                    "Cycling default node pool {} failed at {} (phase: {}, active pool: {}): {}",
                    desired.name,
                    e.stage(),
                    state.phase,
                    state.active_pool_name.as_deref().unwrap_or("unknown"),
                    error_chain(e)
                );
            }
        }
        result
    }

    async fn run(
        &self,
        state: &mut DefaultNodePoolState,
        desired: &DefaultNodePool,
        temporary_name: Option<&str>,
    ) -> Result<CycleReport, CycleError> {
        let temporary_name = temporary_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(CycleError::MissingTemporaryName {
                changed: Vec::new(),
            })?;

        let default_pool = expand_default_node_pool(desired)?;
        validate_rotation_names(&desired.name, temporary_name)?;
        let temporary_pool = default_pool.renamed(temporary_name);

        let default_id = self.cluster.agent_pool(&desired.name);
        let temporary_id = self.cluster.agent_pool(temporary_name);
        state.temporary_name_for_rotation = Some(temporary_name.to_string());

        let temporary_exists = self.exists(PoolRole::Temporary, &temporary_id).await?;
        let default_exists = self.exists(PoolRole::Default, &default_id).await?;

        let mut report = CycleReport::default();

        if temporary_exists {
            info!(
                "Temporary node pool {} already exists, reusing it",
                temporary_name
            );
        } else {
            info!("Creating temporary node pool {}", temporary_name);
            retry_node_pool_creation(NODE_POOL_CREATE_ATTEMPTS, &temporary_id, || {
                self.api
                    .create_or_update_then_poll(&temporary_id, &temporary_pool)
            })
            .await
            .map_err(|source| CycleError::Create {
                role: PoolRole::Temporary,
                pool: temporary_id.clone(),
                source,
            })?;
            report.temporary_pool_created = true;
        }
        state.transition(CyclePhase::TemporaryPoolReady);

        if default_exists {
            info!("Deleting default node pool {}", desired.name);
            self.api
                .delete_then_poll(&default_id)
                .await
                .map_err(|source| CycleError::Delete {
                    role: PoolRole::Default,
                    pool: default_id.clone(),
                    source,
                })?;
            report.default_pool_deleted = true;
        } else {
            debug!("Default node pool {} does not exist, nothing to delete", desired.name);
        }
        state.active_pool_name = Some(temporary_name.to_string());
        state.transition(CyclePhase::DefaultPoolDeleted);

        info!("Creating default node pool {}", desired.name);
        retry_node_pool_creation(NODE_POOL_CREATE_ATTEMPTS, &default_id, || {
            self.api.create_or_update_then_poll(&default_id, &default_pool)
        })
        .await
        .map_err(|source| {
            warn!(
                "Default node pool {} could not be recreated; temporary node pool {} remains active",
                desired.name, temporary_name
            );
            CycleError::Create {
                role: PoolRole::Default,
                pool: default_id.clone(),
                source,
            }
        })?;
        state.active_pool_name = Some(desired.name.clone());
        state.transition(CyclePhase::DefaultPoolCreated);

        info!("Deleting temporary node pool {}", temporary_name);
        self.api
            .delete_then_poll(&temporary_id)
            .await
            .map_err(|source| CycleError::Delete {
                role: PoolRole::Temporary,
                pool: temporary_id.clone(),
                source,
            })?;
        state.transition(CyclePhase::Completed);

        report.active_pool_name = desired.name.clone();
        Ok(report)
    }

    /// Delete a temporary pool left behind by a cycle that recreated the default pool
    /// but failed to remove the temporary one
    ///
    /// Acts only when `state` is at [`CyclePhase::DefaultPoolCreated`]; returns whether
    /// a deletion was issued. On success the cycle is recorded as completed.
    ///
    /// # Errors
    /// [`CycleError::Delete`] when the temporary pool cannot be deleted.
    pub async fn remove_leftover_temporary_pool(
        &self,
        state: &mut DefaultNodePoolState,
        default_name: &str,
    ) -> Result<bool, CycleError> {
        if state.phase != CyclePhase::DefaultPoolCreated {
            return Ok(false);
        }
        let Some(temporary_name) = state
            .temporary_name_for_rotation
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != default_name)
            .map(str::to_string)
        else {
            return Ok(false);
        };

        let temporary_id = self.cluster.agent_pool(&temporary_name);
        let span = info_span!(
            "default_node_pool.finish_cycle",
            cluster.name = %self.cluster.managed_cluster_name,
            pool.name = %default_name,
            temporary.name = %temporary_name
        );

        async {
            info!(
                "Deleting temporary node pool {} left by an earlier cycle",
                temporary_name
            );
            if let Err(source) = self.api.delete_then_poll(&temporary_id).await {
                let e = CycleError::Delete {
                    role: PoolRole::Temporary,
                    pool: temporary_id.clone(),
                    source,
                };
                metrics::increment_cycle_failures(e.stage());
                error!(
                    "Temporary node pool {} is still present: {}",
                    temporary_name,
                    error_chain(&e)
                );
                return Err(e);
            }
            state.active_pool_name = Some(default_name.to_string());
            state.transition(CyclePhase::Completed);
            metrics::increment_cycles_completed();
            Ok(true)
        }
        .instrument(span)
        .await
    }

    async fn exists(&self, role: PoolRole, id: &AgentPoolId) -> Result<bool, CycleError> {
        self.api
            .get(id)
            .await
            .map(|pool| pool.is_some())
            .map_err(|source| CycleError::ExistenceCheck {
                role,
                pool: id.clone(),
                source,
            })
    }
}

/// Run `create` up to `attempts` times, back to back
///
/// Returns the error of the last attempt.
pub(crate) async fn retry_node_pool_creation<F, Fut>(
    attempts: u32,
    pool: &AgentPoolId,
    mut create: F,
) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut attempt = 1;
    loop {
        match create().await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < attempts => {
                warn!(
                    "Creating node pool {} failed (attempt {}/{}): {:#}",
                    pool.agent_pool_name, attempt, attempts, e
                );
                metrics::increment_create_retries();
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
