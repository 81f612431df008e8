//! # Validation
//!
//! Validates agent pool names.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static POOL_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9]{0,11}$")
        .expect("Failed to compile POOL_NAME_REGEX - this should never happen")
});

/// Agent pool name rejected by Resource Manager rules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid agent pool name {name:?}: {reason}")]
pub struct InvalidPoolName {
    pub name: String,
    pub reason: String,
}

/// Validate an agent pool name
///
/// Names must start with a lowercase letter and contain only lowercase letters
/// and digits, at most 12 characters in total.
pub fn validate_agent_pool_name(name: &str) -> Result<(), InvalidPoolName> {
    let invalid = |reason: &str| InvalidPoolName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }

    if POOL_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(invalid(
            "must start with a lowercase letter, contain only lowercase letters and numbers, and be at most 12 characters",
        ))
    }
}

/// Validate the pair of names used while cycling the default pool
pub fn validate_rotation_names(default_name: &str, temporary_name: &str) -> Result<(), InvalidPoolName> {
    validate_agent_pool_name(default_name)?;
    validate_agent_pool_name(temporary_name)?;
    if default_name == temporary_name {
        return Err(InvalidPoolName {
            name: temporary_name.to_string(),
            reason: "temporary name must differ from the default node pool name".to_string(),
        });
    }
    Ok(())
}
