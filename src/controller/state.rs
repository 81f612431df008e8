//! # Cycle State
//!
//! Progress of a default node pool cycle, carried between invocations so a failed
//! cycle can be resumed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Last completed step of a cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CyclePhase {
    /// No cycle has run, or the last change was applied in place
    #[default]
    Idle,
    /// The temporary pool exists and can host system workloads
    TemporaryPoolReady,
    /// The default pool is gone; the temporary pool is the only system pool
    DefaultPoolDeleted,
    /// The default pool was recreated, the temporary pool still exists
    DefaultPoolCreated,
    Completed,
}

impl CyclePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::TemporaryPoolReady => "temporaryPoolReady",
            CyclePhase::DefaultPoolDeleted => "defaultPoolDeleted",
            CyclePhase::DefaultPoolCreated => "defaultPoolCreated",
            CyclePhase::Completed => "completed",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recorded state of the default node pool slot
///
/// Updated by the coordinator after every step, including when a step fails, so the
/// caller can persist it and resume from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultNodePoolState {
    /// Pool currently serving as the default pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_pool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary_name_for_rotation: Option<String>,
    #[serde(default)]
    pub phase: CyclePhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl DefaultNodePoolState {
    pub fn new(active_pool_name: impl Into<String>) -> Self {
        Self {
            active_pool_name: Some(active_pool_name.into()),
            ..Self::default()
        }
    }

    /// Move to `phase` and stamp the transition time
    pub fn transition(&mut self, phase: CyclePhase) {
        self.phase = phase;
        self.last_transition_time = Some(Utc::now());
    }

    /// True while a cycle has started but not finished
    pub fn is_cycle_in_progress(&self) -> bool {
        !matches!(self.phase, CyclePhase::Idle | CyclePhase::Completed)
    }

    /// True when the temporary pool is what currently serves as the default pool
    pub fn is_temporary_pool_active(&self) -> bool {
        match (&self.active_pool_name, &self.temporary_name_for_rotation) {
            (Some(active), Some(temp)) => active == temp,
            _ => false,
        }
    }
}
