//! # Azure Resource Manager Authentication
//!
//! Handles credential creation and token retrieval for Resource Manager requests,
//! including a mock credential for mock-server runs.

use crate::config::{AzureAuthConfig, AzureConfig};
use crate::constants::ARM_TOKEN_SCOPE;
use anyhow::{Context, Result};
use azure_core::credentials::{AccessToken, Secret, TokenCredential, TokenRequestOptions};
use azure_identity::{ManagedIdentityCredential, WorkloadIdentityCredential};
use std::sync::Arc;
use tracing::{debug, info};

/// Mock TokenCredential for mock-server runs
/// Returns a dummy token without attempting real Azure authentication
#[derive(Debug)]
pub struct MockTokenCredential;

#[async_trait::async_trait]
impl TokenCredential for MockTokenCredential {
    async fn get_token(
        &self,
        _scopes: &[&str],
        _options: Option<TokenRequestOptions<'_>>,
    ) -> azure_core::Result<AccessToken> {
        use typespec_client_core::time::{Duration, OffsetDateTime};

        Ok(AccessToken::new(
            Secret::new("test-token".to_string()),
            OffsetDateTime::now_utc() + Duration::seconds(3600),
        ))
    }
}

/// Create Azure credential based on configuration
/// Supports Workload Identity, Managed Identity, and a mock credential
pub fn create_credential(config: &AzureConfig, mock_mode: bool) -> Result<Arc<dyn TokenCredential>> {
    let credential: Arc<dyn TokenCredential> = if mock_mode {
        debug!("Mock mode: using mock Azure credential");
        Arc::new(MockTokenCredential)
    } else {
        match &config.auth {
            Some(AzureAuthConfig::WorkloadIdentity { client_id }) => {
                info!(
                    "Using Azure Workload Identity authentication with client ID: {}",
                    client_id
                );
                let options = azure_identity::WorkloadIdentityCredentialOptions {
                    client_id: Some(client_id.clone()),
                    ..Default::default()
                };
                // Note: Credential constructors return Arc<dyn TokenCredential>
                WorkloadIdentityCredential::new(Some(options))
                    .context("Failed to create WorkloadIdentityCredential")?
            }
            None => {
                info!("No auth configuration specified, using Managed Identity");
                ManagedIdentityCredential::new(None)
                    .context("Failed to create ManagedIdentityCredential")?
            }
        }
    };

    Ok(credential)
}

/// Get a bearer token for Azure Resource Manager
pub async fn get_token(credential: &Arc<dyn TokenCredential>) -> Result<String> {
    let scope = &[ARM_TOKEN_SCOPE];
    let options = Some(TokenRequestOptions::default());
    let token_response = credential
        .get_token(scope, options)
        .await
        .context("Failed to get Azure Resource Manager access token")?;
    Ok(token_response.token.secret().to_string())
}
