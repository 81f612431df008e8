//! # Long-Running Operation Polling
//!
//! Resource Manager answers agent pool PUT/DELETE before the work is done. The
//! poller follows, in order of preference:
//!
//! - `Azure-AsyncOperation`: status document with `InProgress`/`Succeeded`/`Failed`/`Canceled`
//! - `Location`: `202 Accepted` while running, `200`/`204` once finished
//! - the resource itself: its `properties.provisioningState`

use super::auth::get_token;
use super::types::{ArmErrorResponse, OperationState, OperationStatus};
use crate::model::AgentPool;
use anyhow::{Context, Result};
use azure_core::credentials::TokenCredential;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Response, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

pub(crate) const AZURE_ASYNC_OPERATION_HEADER: &str = "Azure-AsyncOperation";
pub(crate) const LOCATION_HEADER: &str = "Location";
pub(crate) const RETRY_AFTER_HEADER: &str = "Retry-After";

/// Where to look for the outcome of a long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PollTarget {
    AsyncOperation(String),
    Location(String),
    Resource(String),
}

impl PollTarget {
    /// Pick the polling URL advertised by a response, if any
    pub(crate) fn from_headers(headers: &HeaderMap) -> Option<Self> {
        if let Some(url) = header_str(headers, AZURE_ASYNC_OPERATION_HEADER) {
            return Some(PollTarget::AsyncOperation(url));
        }
        header_str(headers, LOCATION_HEADER).map(PollTarget::Location)
    }

    fn url(&self) -> &str {
        match self {
            PollTarget::AsyncOperation(url)
            | PollTarget::Location(url)
            | PollTarget::Resource(url) => url,
        }
    }
}

/// Polls long-running operations until they reach a terminal state or time out
#[derive(Clone)]
pub(crate) struct OperationPoller {
    http_client: ReqwestClient,
    credential: Arc<dyn TokenCredential>,
    default_interval: Duration,
    timeout: Duration,
}

impl std::fmt::Debug for OperationPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationPoller")
            .field("default_interval", &self.default_interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OperationPoller {
    pub(crate) fn new(
        http_client: ReqwestClient,
        credential: Arc<dyn TokenCredential>,
        default_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            credential,
            default_interval,
            timeout,
        }
    }

    /// Wait for `target` to finish
    ///
    /// `initial_delay` is the `Retry-After` of the response that started the operation.
    pub(crate) async fn wait(
        &self,
        operation: &str,
        target: &PollTarget,
        initial_delay: Option<Duration>,
    ) -> Result<()> {
        let started = Instant::now();
        let mut delay = initial_delay.unwrap_or(self.default_interval);

        loop {
            if started.elapsed() + delay > self.timeout {
                return Err(anyhow::anyhow!(
                    "{operation}: long-running operation did not finish within {} seconds",
                    self.timeout.as_secs()
                ));
            }
            tokio::time::sleep(delay).await;

            let token = get_token(&self.credential).await?;
            let response = self
                .http_client
                .get(target.url())
                .header("Authorization", format!("Bearer {token}"))
                .send()
                .await
                .with_context(|| format!("{operation}: failed to poll long-running operation"))?;

            let next_delay = retry_after(response.headers());
            let state = self.observe(operation, target, response).await?;
            debug!(
                operation = operation,
                state = ?state,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Polled long-running operation"
            );

            if state == OperationState::Succeeded {
                return Ok(());
            }
            delay = next_delay.unwrap_or(self.default_interval);
        }
    }

    /// Interpret one poll response; terminal failures become errors
    async fn observe(
        &self,
        operation: &str,
        target: &PollTarget,
        response: Response,
    ) -> Result<OperationState> {
        let status = response.status();
        match target {
            PollTarget::AsyncOperation(_) => {
                if !status.is_success() {
                    return Err(error_from_response(operation, response).await);
                }
                let body: OperationStatus = response
                    .json()
                    .await
                    .with_context(|| format!("{operation}: failed to decode operation status"))?;
                let state = OperationState::parse(&body.status);
                match state {
                    OperationState::Failed | OperationState::Canceled => {
                        let detail = body
                            .error
                            .map(|e| e.to_string())
                            .unwrap_or_else(|| "no error details returned".to_string());
                        Err(anyhow::anyhow!(
                            "{operation}: long-running operation {} - {detail}",
                            body.status
                        ))
                    }
                    _ => Ok(state),
                }
            }
            PollTarget::Location(_) => match status {
                StatusCode::ACCEPTED => Ok(OperationState::InProgress),
                s if s.is_success() => Ok(OperationState::Succeeded),
                _ => Err(error_from_response(operation, response).await),
            },
            PollTarget::Resource(_) => {
                if !status.is_success() {
                    return Err(error_from_response(operation, response).await);
                }
                let pool: AgentPool = response
                    .json()
                    .await
                    .with_context(|| format!("{operation}: failed to decode agent pool"))?;
                let provisioning_state = pool.provisioning_state().unwrap_or("Succeeded");
                match OperationState::parse(provisioning_state) {
                    OperationState::Failed | OperationState::Canceled => Err(anyhow::anyhow!(
                        "{operation}: agent pool provisioning {provisioning_state}"
                    )),
                    state => Ok(state),
                }
            }
        }
    }
}

/// `Retry-After` in whole seconds
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_str(headers, RETRY_AFTER_HEADER)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .filter(|value| !value.is_empty())
}

/// Turn a non-success response into an error carrying the Resource Manager error body
pub(crate) async fn error_from_response(operation: &str, response: Response) -> anyhow::Error {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ArmErrorResponse>(&error_text)
        .map(|body| body.error.to_string())
        .unwrap_or(error_text);
    anyhow::anyhow!("{operation}: HTTP {status} - {detail}")
}
