//! # Azure Agent Pools Client
//!
//! Client for the Microsoft.ContainerService `agentPools` REST API.
//!
//! This module provides functionality to:
//! - Read an agent pool (404 is reported as absent)
//! - Create or replace an agent pool and wait for provisioning
//! - Delete an agent pool and wait for the deletion
//! - List the Kubernetes versions available to a cluster's agent pools

use super::auth::get_token;
use super::lro::{error_from_response, retry_after, OperationPoller, PollTarget};
use super::types::AvailableAgentPoolVersions;
use crate::config::ClientConfig;
use crate::model::{AgentPool, AgentPoolId, ClusterId};
use crate::observability::metrics;
use crate::provider::AgentPoolApi;
use anyhow::{Context, Result};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use reqwest::{Client as ReqwestClient, StatusCode};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

/// Azure Resource Manager implementation of [`AgentPoolApi`]
pub struct AzureAgentPools {
    http_client: ReqwestClient,
    credential: Arc<dyn TokenCredential>,
    endpoint: String,
    api_version: String,
    poller: OperationPoller,
}

impl std::fmt::Debug for AzureAgentPools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureAgentPools")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl AzureAgentPools {
    /// Create a new agent pools client
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &ClientConfig, credential: Arc<dyn TokenCredential>) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .build()
            .context("Failed to create HTTP client")?;

        let poller = OperationPoller::new(
            http_client.clone(),
            credential.clone(),
            config.poll_interval(),
            config.operation_timeout(),
        );

        Ok(Self {
            http_client,
            credential,
            endpoint: config.endpoint().to_string(),
            api_version: config.api_version.clone(),
            poller,
        })
    }

    /// Request URL for an agent pool: `{endpoint}{id}?api-version={version}`
    pub fn resource_url(&self, id: &AgentPoolId) -> String {
        format!("{}{}?api-version={}", self.endpoint, id, self.api_version)
    }

    /// Request URL for the versions agent pools of `cluster` can run
    pub fn available_versions_url(&self, cluster: &ClusterId) -> String {
        format!(
            "{}{}/availableAgentPoolVersions?api-version={}",
            self.endpoint, cluster, self.api_version
        )
    }

    async fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", get_token(&self.credential).await?))
    }
}

#[async_trait]
impl AgentPoolApi for AzureAgentPools {
    async fn get(&self, id: &AgentPoolId) -> Result<Option<AgentPool>> {
        let span = tracing::debug_span!(
            "azure.agent_pool.get",
            agent_pool.name = %id.agent_pool_name,
            cluster.name = %id.cluster.managed_cluster_name
        );
        let start = Instant::now();

        async move {
            let operation = format!("retrieving agent pool {id}");
            let response = self
                .http_client
                .get(self.resource_url(id))
                .header("Authorization", self.bearer().await?)
                .send()
                .await
                .with_context(|| format!("{operation}: request failed"))?;

            if response.status() == StatusCode::NOT_FOUND {
                debug!("Agent pool {} does not exist", id.agent_pool_name);
                metrics::record_pool_operation("get", true, start.elapsed().as_secs_f64());
                return Ok(None);
            }

            if !response.status().is_success() {
                metrics::record_pool_operation("get", false, start.elapsed().as_secs_f64());
                return Err(error_from_response(&operation, response).await);
            }

            let pool: AgentPool = response
                .json()
                .await
                .with_context(|| format!("{operation}: failed to decode response"))?;
            metrics::record_pool_operation("get", true, start.elapsed().as_secs_f64());
            Ok(Some(pool))
        }
        .instrument(span)
        .await
    }

    async fn create_or_update_then_poll(&self, id: &AgentPoolId, pool: &AgentPool) -> Result<()> {
        let span = info_span!(
            "azure.agent_pool.create_or_update",
            agent_pool.name = %id.agent_pool_name,
            cluster.name = %id.cluster.managed_cluster_name
        );
        let start = Instant::now();

        async move {
            info!("Creating/updating agent pool: {}", id.agent_pool_name);
            let operation = format!("creating/updating agent pool {id}");
            let url = self.resource_url(id);
            let response = self
                .http_client
                .put(&url)
                .header("Authorization", self.bearer().await?)
                .header("Content-Type", "application/json")
                .json(pool)
                .send()
                .await
                .with_context(|| format!("{operation}: request failed"))?;

            if !response.status().is_success() {
                metrics::record_pool_operation("put", false, start.elapsed().as_secs_f64());
                return Err(error_from_response(&operation, response).await);
            }

            let initial_delay = retry_after(response.headers());
            let target = match PollTarget::from_headers(response.headers()) {
                Some(target) => Some(target),
                None => {
                    // No operation header: the body's provisioningState tells whether to poll
                    let created: AgentPool = response
                        .json()
                        .await
                        .with_context(|| format!("{operation}: failed to decode response"))?;
                    let done = created
                        .provisioning_state()
                        .is_none_or(|state| state.eq_ignore_ascii_case("Succeeded"));
                    (!done).then(|| PollTarget::Resource(url.clone()))
                }
            };

            let result = match target {
                Some(target) => self.poller.wait(&operation, &target, initial_delay).await,
                None => Ok(()),
            };
            metrics::record_pool_operation("put", result.is_ok(), start.elapsed().as_secs_f64());
            result
        }
        .instrument(span)
        .await
    }

    async fn delete_then_poll(&self, id: &AgentPoolId) -> Result<()> {
        let span = info_span!(
            "azure.agent_pool.delete",
            agent_pool.name = %id.agent_pool_name,
            cluster.name = %id.cluster.managed_cluster_name
        );
        let start = Instant::now();

        async move {
            info!("Deleting agent pool: {}", id.agent_pool_name);
            let operation = format!("deleting agent pool {id}");
            let response = self
                .http_client
                .delete(self.resource_url(id))
                .header("Authorization", self.bearer().await?)
                .send()
                .await
                .with_context(|| format!("{operation}: request failed"))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
                debug!("Agent pool {} already absent", id.agent_pool_name);
                metrics::record_pool_operation("delete", true, start.elapsed().as_secs_f64());
                return Ok(());
            }
            if !status.is_success() {
                metrics::record_pool_operation("delete", false, start.elapsed().as_secs_f64());
                return Err(error_from_response(&operation, response).await);
            }

            let initial_delay = retry_after(response.headers());
            let result = match PollTarget::from_headers(response.headers()) {
                Some(target) => self.poller.wait(&operation, &target, initial_delay).await,
                None => Ok(()),
            };
            metrics::record_pool_operation("delete", result.is_ok(), start.elapsed().as_secs_f64());
            result
        }
        .instrument(span)
        .await
    }

    async fn available_versions(&self, cluster: &ClusterId) -> Result<Vec<String>> {
        let span = tracing::debug_span!(
            "azure.agent_pool.available_versions",
            cluster.name = %cluster.managed_cluster_name
        );
        let start = Instant::now();

        async move {
            let operation = format!("retrieving available agent pool versions for {cluster}");
            let response = self
                .http_client
                .get(self.available_versions_url(cluster))
                .header("Authorization", self.bearer().await?)
                .send()
                .await
                .with_context(|| format!("{operation}: request failed"))?;

            if !response.status().is_success() {
                metrics::record_pool_operation("versions", false, start.elapsed().as_secs_f64());
                return Err(error_from_response(&operation, response).await);
            }

            let versions: AvailableAgentPoolVersions = response
                .json()
                .await
                .with_context(|| format!("{operation}: failed to decode response"))?;
            metrics::record_pool_operation("versions", true, start.elapsed().as_secs_f64());
            Ok(versions.kubernetes_versions())
        }
        .instrument(span)
        .await
    }
}
