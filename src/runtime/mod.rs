//! # Runtime Module
//!
//! Process start-up for the `poolctl` binary.

pub mod initialization;

pub use initialization::*;
