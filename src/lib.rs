//! # Node Pool Cycler
//!
//! Resumable updates of the default (system) node pool of an Azure Kubernetes Service cluster.
//!
//! ## Overview
//!
//! Some settings of an agent pool (VM size, disks, subnets, zones, kubelet and OS
//! configuration, ...) cannot be changed once the pool exists. Changing them on the
//! default node pool means cycling it:
//!
//! 1. **Create a temporary pool** with the new settings, so system workloads keep running
//! 2. **Delete the default pool**
//! 3. **Recreate the default pool** under its own name with the new settings
//! 4. **Delete the temporary pool**
//!
//! Every step can fail. The cycle records its progress in [`DefaultNodePoolState`] and
//! picks up where it stopped on the next run; the temporary pool is only removed once the
//! default pool is back.
//!
//! ## Features
//!
//! - **Change detection**: in-place `PUT` when possible, cycle only when required
//! - **Resumable cycles**: existing temporary pools are reused, missing default pools are recreated
//! - **Azure Resource Manager client**: long-running-operation polling with `Retry-After`
//! - **Prometheus metrics**: agent pool operations, updates and cycle outcomes
//!
//! [`DefaultNodePoolState`]: controller::DefaultNodePoolState

pub mod config;
pub mod constants;
pub mod controller;
pub mod model;
pub mod observability;
pub mod provider;
pub mod runtime;
