//! # Provider Module
//!
//! Access to the external agent pool API.
//!
//! The cycle coordinator only talks to [`AgentPoolApi`]; the Azure Resource Manager
//! implementation lives in [`azure`].

use crate::model::{AgentPool, AgentPoolId, ClusterId};
use anyhow::Result;
use async_trait::async_trait;

pub mod azure;

#[cfg(test)]
pub(crate) mod fake;

/// CRUD operations on a cluster's agent pools
///
/// Mutating calls block until the service reports the long-running operation as finished.
#[async_trait]
pub trait AgentPoolApi: Send + Sync {
    /// Get an agent pool. Returns `Ok(None)` if it does not exist.
    async fn get(&self, id: &AgentPoolId) -> Result<Option<AgentPool>>;

    /// Create or replace an agent pool and wait for provisioning to finish
    async fn create_or_update_then_poll(&self, id: &AgentPoolId, pool: &AgentPool) -> Result<()>;

    /// Delete an agent pool and wait for the deletion to finish
    async fn delete_then_poll(&self, id: &AgentPoolId) -> Result<()>;

    /// Kubernetes versions the agent pools of `cluster` can be upgraded to
    async fn available_versions(&self, cluster: &ClusterId) -> Result<Vec<String>>;
}
