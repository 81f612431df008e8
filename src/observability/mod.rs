//! # Observability
//!
//! Prometheus metrics for agent pool operations and default node pool cycles.

pub mod metrics;
