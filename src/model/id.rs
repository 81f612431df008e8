//! # Resource Identifiers
//!
//! Azure Resource Manager IDs for managed clusters and their agent pools.
//!
//! Format:
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.ContainerService/managedClusters/{cluster}/agentPools/{pool}`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const PROVIDER_NAMESPACE: &str = "Microsoft.ContainerService";

/// Error returned when a string is not a valid resource ID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid resource ID {input:?}: {reason}")]
pub struct ResourceIdError {
    pub input: String,
    pub reason: String,
}

impl ResourceIdError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Managed cluster identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub managed_cluster_name: String,
}

impl ClusterId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        managed_cluster_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            managed_cluster_name: managed_cluster_name.into(),
        }
    }

    /// ID of the agent pool `name` inside this cluster
    pub fn agent_pool(&self, name: &str) -> AgentPoolId {
        AgentPoolId {
            cluster: self.clone(),
            agent_pool_name: name.to_string(),
        }
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/managedClusters/{}",
            self.subscription_id, self.resource_group_name, PROVIDER_NAMESPACE, self.managed_cluster_name
        )
    }
}

impl FromStr for ClusterId {
    type Err = ResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = parse_segments(s)?;
        if segments.len() != 4 {
            return Err(ResourceIdError::new(
                s,
                "expected subscriptions/resourceGroups/providers/managedClusters segments",
            ));
        }
        cluster_from_segments(s, &segments)
    }
}

/// Agent pool identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPoolId {
    pub cluster: ClusterId,
    pub agent_pool_name: String,
}

impl AgentPoolId {
    pub fn new(cluster: ClusterId, agent_pool_name: impl Into<String>) -> Self {
        Self {
            cluster,
            agent_pool_name: agent_pool_name.into(),
        }
    }
}

impl fmt::Display for AgentPoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/agentPools/{}", self.cluster, self.agent_pool_name)
    }
}

impl FromStr for AgentPoolId {
    type Err = ResourceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = parse_segments(s)?;
        if segments.len() != 5 {
            return Err(ResourceIdError::new(
                s,
                "expected subscriptions/resourceGroups/providers/managedClusters/agentPools segments",
            ));
        }
        let cluster = cluster_from_segments(s, &segments[..4])?;
        let agent_pool_name = expect_segment(s, &segments[4], "agentPools")?;
        Ok(Self {
            cluster,
            agent_pool_name,
        })
    }
}

/// Split an ID into `(key, value)` pairs, rejecting odd segment counts and empty values
fn parse_segments(s: &str) -> Result<Vec<(String, String)>, ResourceIdError> {
    let parts: Vec<&str> = s.trim().trim_matches('/').split('/').collect();
    if parts.len() % 2 != 0 || parts.iter().any(|p| p.is_empty()) {
        return Err(ResourceIdError::new(
            s,
            "expected alternating key/value segments",
        ));
    }
    Ok(parts
        .chunks(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect())
}

/// Segment keys are matched case-insensitively, as Resource Manager does
fn expect_segment(
    input: &str,
    segment: &(String, String),
    key: &str,
) -> Result<String, ResourceIdError> {
    if segment.0.eq_ignore_ascii_case(key) {
        Ok(segment.1.clone())
    } else {
        Err(ResourceIdError::new(
            input,
            format!("expected segment {key:?}, found {:?}", segment.0),
        ))
    }
}

fn cluster_from_segments(
    input: &str,
    segments: &[(String, String)],
) -> Result<ClusterId, ResourceIdError> {
    let subscription_id = expect_segment(input, &segments[0], "subscriptions")?;
    let resource_group_name = expect_segment(input, &segments[1], "resourceGroups")?;
    let provider = expect_segment(input, &segments[2], "providers")?;
    if !provider.eq_ignore_ascii_case(PROVIDER_NAMESPACE) {
        return Err(ResourceIdError::new(
            input,
            format!("expected provider {PROVIDER_NAMESPACE:?}, found {provider:?}"),
        ));
    }
    let managed_cluster_name = expect_segment(input, &segments[3], "managedClusters")?;
    Ok(ClusterId {
        subscription_id,
        resource_group_name,
        managed_cluster_name,
    })
}
