//! Tests against the mock Resource Manager server
//!
//! `server` holds the mock itself; `agent_pools` covers the REST client and `cycle`
//! covers updates and cycles driven through it.

pub mod server;

mod agent_pools;
mod common;
mod cycle;
