//! # Controller
//!
//! Default node pool update handling: change detection, the cycle coordinator, the
//! updater dispatching between in-place updates and cycles, and the recorded cycle state.

pub mod cycle;
pub mod diff;
pub mod error;
pub mod state;
pub mod update;
pub mod version;

pub use cycle::{CycleReport, NodePoolCycleCoordinator};
pub use diff::{
    name_change_forces_replacement, os_sku_change_requires_cycle, requires_cycle,
    NodePoolChanges, PoolField,
};
pub use error::{CycleError, PoolRole, UpdateError};
pub use state::{CyclePhase, DefaultNodePoolState};
pub use update::{plan_update, DefaultNodePoolUpdater, PlannedAction, UpdateOutcome, UpdatePlan};
pub use version::{node_pool_supports_version, validate_node_pool_version};
