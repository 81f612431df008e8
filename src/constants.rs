//! # Constants
//!
//! Default values shared by configuration, the Azure client and the cycle coordinator.

/// Azure Resource Manager endpoint for the public cloud
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

/// OAuth scope requested for Azure Resource Manager tokens
pub const ARM_TOKEN_SCOPE: &str = "https://management.azure.com/.default";

/// Microsoft.ContainerService API version used for agent pool requests
pub const DEFAULT_AKS_API_VERSION: &str = "2025-02-01";

/// Fallback interval between long-running-operation polls (milliseconds)
/// Used when the service does not send a `Retry-After` header
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

/// Upper bound for a single long-running operation (seconds)
/// Matches the 90 minute update timeout of the cluster resource
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 5_400;

/// Number of attempts made when creating an agent pool during a cycle
pub const NODE_POOL_CREATE_ATTEMPTS: u32 = 3;

/// Default tracing filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "node_pool_cycler=info,poolctl=info";

/// Taint applied to the default pool when only critical addons may be scheduled on it
pub const CRITICAL_ADDONS_ONLY_TAINT: &str = "CriticalAddonsOnly=true:NoSchedule";
