//! # Metrics
//!
//! Prometheus metrics for the node pool cycler.
//!
//! Metrics live in a crate-wide registry and are rendered in the text exposition
//! format by [`encode_metrics`] (`poolctl apply --print-metrics`).

mod pool_metrics;
mod registry;

pub use pool_metrics::*;

use anyhow::{Context, Result};
use prometheus::{Encoder, TextEncoder};
use std::sync::OnceLock;

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Register all metrics with the registry
///
/// Safe to call more than once; only the first call registers.
pub fn register_metrics() -> Result<()> {
    REGISTERED
        .get_or_init(|| pool_metrics::register_pool_metrics().map_err(|e| e.to_string()))
        .clone()
        .map_err(|e| anyhow::anyhow!("Failed to register metrics: {e}"))
}

/// Render every registered metric in the Prometheus text format
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = registry::REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not valid UTF-8")
}
