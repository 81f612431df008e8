//! # Azure Authentication Configuration

use serde::{Deserialize, Serialize};

/// Azure authentication settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureConfig {
    /// Azure authentication configuration. If not specified, defaults to Managed Identity.
    #[serde(default)]
    pub auth: Option<AzureAuthConfig>,
}

/// Azure authentication method
/// Only Workload Identity is configurable; Managed Identity is the fallback
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "authType")]
pub enum AzureAuthConfig {
    /// Use Azure Workload Identity for authentication
    #[serde(rename = "WorkloadIdentity")]
    WorkloadIdentity {
        /// Azure AD application (client) ID federated with the service account
        #[serde(rename = "clientId")]
        client_id: String,
    },
}

impl AzureConfig {
    /// Workload Identity when `AZURE_CLIENT_ID` is set, Managed Identity otherwise
    pub fn from_env() -> Self {
        let auth = std::env::var("AZURE_CLIENT_ID")
            .ok()
            .filter(|client_id| !client_id.trim().is_empty())
            .map(|client_id| AzureAuthConfig::WorkloadIdentity { client_id });
        Self { auth }
    }
}
