//! # Model
//!
//! Configuration model of the default node pool, the Resource Manager agent pool
//! payload, resource identifiers, and the conversions between them.

pub mod agent_pool;
pub mod default_node_pool;
pub mod expand;
pub mod id;
pub mod validation;

pub use agent_pool::{
    AgentPool, AgentPoolMode, AgentPoolProperties, KubeletDiskType, OsDiskType, OsSku,
    UpgradeSettingsPayload,
};
pub use default_node_pool::{DefaultNodePool, KubeletConfig, LinuxOsConfig, SysctlConfig, UpgradeSettings};
pub use expand::{expand_default_node_pool, flatten_agent_pool, ExpandError};
pub use id::{AgentPoolId, ClusterId, ResourceIdError};
pub use validation::{validate_agent_pool_name, validate_rotation_names, InvalidPoolName};
