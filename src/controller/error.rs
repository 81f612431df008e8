//! # Controller Errors
//!
//! Failures of a default node pool update or cycle. Every API failure carries the
//! pool it concerned and the role that pool plays in the cycle.

use super::diff::PoolField;
use crate::model::{AgentPoolId, ClusterId, ExpandError, InvalidPoolName};
use std::fmt;
use thiserror::Error;

/// Role of a pool during a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolRole {
    Default,
    Temporary,
}

impl fmt::Display for PoolRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolRole::Default => f.write_str("default"),
            PoolRole::Temporary => f.write_str("temporary"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error(
        "`temporary_name_for_rotation` must be specified when updating any of the following properties: {}",
        describe_fields(changed)
    )]
    MissingTemporaryName { changed: Vec<PoolField> },

    #[error("invalid `temporary_name_for_rotation`")]
    InvalidTemporaryName(#[from] InvalidPoolName),

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error("checking for existing {role} node pool {pool}")]
    ExistenceCheck {
        role: PoolRole,
        pool: AgentPoolId,
        #[source]
        source: anyhow::Error,
    },

    #[error("creating {role} node pool {pool}")]
    Create {
        role: PoolRole,
        pool: AgentPoolId,
        #[source]
        source: anyhow::Error,
    },

    #[error("deleting {role} node pool {pool}")]
    Delete {
        role: PoolRole,
        pool: AgentPoolId,
        #[source]
        source: anyhow::Error,
    },
}

impl CycleError {
    /// Short label of the step that failed, used as a metric label
    pub fn stage(&self) -> &'static str {
        match self {
            CycleError::MissingTemporaryName { .. }
            | CycleError::InvalidTemporaryName(_)
            | CycleError::Expand(_) => "precondition",
            CycleError::ExistenceCheck { .. } => "existence_check",
            CycleError::Create {
                role: PoolRole::Temporary,
                ..
            } => "create_temporary",
            CycleError::Delete {
                role: PoolRole::Default,
                ..
            } => "delete_default",
            CycleError::Create {
                role: PoolRole::Default,
                ..
            } => "create_default",
            CycleError::Delete {
                role: PoolRole::Temporary,
                ..
            } => "delete_temporary",
        }
    }
}

/// Failure of [`DefaultNodePoolUpdater::update`](super::DefaultNodePoolUpdater::update)
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error(transparent)]
    Expand(#[from] ExpandError),

    #[error("updating default node pool {pool}")]
    InPlace {
        pool: AgentPoolId,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "renaming the default node pool from {from:?} to {to:?} requires replacing the cluster"
    )]
    ReplacementRequired { from: String, to: String },

    #[error("retrieving available agent pool versions for {cluster}")]
    VersionLookup {
        cluster: ClusterId,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "orchestrator version {version:?} is not supported by the cluster; supported versions: {}",
        supported.join(", ")
    )]
    UnsupportedVersion { version: String, supported: Vec<String> },
}

/// `error` followed by each of its sources, separated by `: `
pub(crate) fn error_chain(error: &dyn std::error::Error) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

fn describe_fields(fields: &[PoolField]) -> String {
    let fields = if fields.is_empty() {
        PoolField::CYCLE_FIELDS.as_slice()
    } else {
        fields
    };
    fields
        .iter()
        .map(|field| format!("{:?}", field.attribute()))
        .collect::<Vec<_>>()
        .join(", ")
}
