//! # Orchestrator Version Check
//!
//! A Kubernetes version requested for the default node pool must be one the cluster
//! offers its agent pools. The version the pool already runs is always accepted, so
//! pools on a retired version can still be updated.

use super::error::UpdateError;

/// Whether `desired` may be requested for a pool currently running `current`
///
/// `available` lists full versions (`1.30.3`); a `major.minor` alias (`1.30`) matches
/// any listed patch of that minor version.
pub fn node_pool_supports_version(current: Option<&str>, desired: &str, available: &[String]) -> bool {
    if current == Some(desired) {
        return true;
    }
    available.iter().any(|version| {
        version == desired
            || version
                .rsplit_once('.')
                .is_some_and(|(minor, _)| minor == desired)
    })
}

/// [`node_pool_supports_version`] as a [`Result`]
///
/// # Errors
/// [`UpdateError::UnsupportedVersion`] listing the available versions.
pub fn validate_node_pool_version(
    current: Option<&str>,
    desired: &str,
    available: &[String],
) -> Result<(), UpdateError> {
    if node_pool_supports_version(current, desired, available) {
        Ok(())
    } else {
        Err(UpdateError::UnsupportedVersion {
            version: desired.to_string(),
            supported: available.to_vec(),
        })
    }
}
