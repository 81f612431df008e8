//! # Resource Manager Types
//!
//! Error and operation-status documents returned by Azure Resource Manager.

use serde::{Deserialize, Serialize};

/// Error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmErrorResponse {
    pub error: ArmError,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArmError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for ArmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.code, self.message),
            (false, true) => write!(f, "{}", self.code),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Body returned by an `Azure-AsyncOperation` URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ArmError>,
}

/// Body of `managedClusters/{name}/availableAgentPoolVersions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailableAgentPoolVersions {
    #[serde(default)]
    pub properties: AvailableAgentPoolVersionsProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableAgentPoolVersionsProperties {
    #[serde(default)]
    pub agent_pool_versions: Vec<AgentPoolVersion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPoolVersion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_preview: Option<bool>,
}

impl AvailableAgentPoolVersions {
    /// Listed Kubernetes versions, skipping entries without one
    pub fn kubernetes_versions(&self) -> Vec<String> {
        self.properties
            .agent_pool_versions
            .iter()
            .filter_map(|version| version.kubernetes_version.clone())
            .collect()
    }
}

/// State of a long-running operation or of a resource's `provisioningState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationState {
    /// Unknown values (`Creating`, `Updating`, `Deleting`, ...) are still running
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "succeeded" => OperationState::Succeeded,
            "failed" => OperationState::Failed,
            "canceled" | "cancelled" => OperationState::Canceled,
            _ => OperationState::InProgress,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, OperationState::InProgress)
    }
}
