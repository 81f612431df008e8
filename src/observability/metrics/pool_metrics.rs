//! # Pool Metrics
//!
//! Metrics for agent pool API calls, default node pool updates and cycles.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::{HistogramVec, IntCounter, IntCounterVec};
use std::sync::LazyLock;

// Agent pool API metrics
static AGENT_POOL_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "node_pool_cycler_agent_pool_operations_total",
            "Total number of agent pool API operations by operation and result",
        ),
        &["operation", "result"],
    )
    .expect("Failed to create AGENT_POOL_OPERATIONS_TOTAL metric - this should never happen")
});

static AGENT_POOL_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "node_pool_cycler_agent_pool_operation_duration_seconds",
            "Duration of agent pool API operations in seconds, including long-running-operation polling",
        )
        .buckets(vec![0.5, 1.0, 5.0, 30.0, 120.0, 300.0, 900.0, 1800.0]),
        &["operation"],
    )
    .expect("Failed to create AGENT_POOL_OPERATION_DURATION metric - this should never happen")
});

// Default node pool update metrics
static DEFAULT_POOL_UPDATES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "node_pool_cycler_default_pool_updates_total",
            "Total number of default node pool updates by outcome (unchanged, in_place, cycled, failed)",
        ),
        &["outcome"],
    )
    .expect("Failed to create DEFAULT_POOL_UPDATES_TOTAL metric - this should never happen")
});

// Cycle metrics
static CYCLES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "node_pool_cycler_cycles_total",
            "Total number of default node pool cycles by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create CYCLES_TOTAL metric - this should never happen")
});

static CYCLE_FAILURES_BY_STAGE: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "node_pool_cycler_cycle_failures_total",
            "Total number of failed cycles by the stage that failed",
        ),
        &["stage"],
    )
    .expect("Failed to create CYCLE_FAILURES_BY_STAGE metric - this should never happen")
});

static CREATE_RETRIES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "node_pool_cycler_create_retries_total",
        "Total number of agent pool creation attempts that failed and were retried",
    )
    .expect("Failed to create CREATE_RETRIES_TOTAL metric - this should never happen")
});

pub(crate) fn register_pool_metrics() -> Result<()> {
    REGISTRY.register(Box::new(AGENT_POOL_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(AGENT_POOL_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(DEFAULT_POOL_UPDATES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CYCLES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CYCLE_FAILURES_BY_STAGE.clone()))?;
    REGISTRY.register(Box::new(CREATE_RETRIES_TOTAL.clone()))?;
    Ok(())
}

// Public functions for pool metrics

/// Record one agent pool API call (`get`, `put`, `delete`)
pub fn record_pool_operation(operation: &str, success: bool, duration: f64) {
    let result = if success { "success" } else { "error" };
    AGENT_POOL_OPERATIONS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
    AGENT_POOL_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_default_pool_updates(outcome: &str) {
    DEFAULT_POOL_UPDATES_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

pub fn increment_cycles_completed() {
    CYCLES_TOTAL.with_label_values(&["completed"]).inc();
}

/// Count a failed cycle and the stage it stopped at
pub fn increment_cycle_failures(stage: &str) {
    CYCLES_TOTAL.with_label_values(&["failed"]).inc();
    CYCLE_FAILURES_BY_STAGE.with_label_values(&[stage]).inc();
}

pub fn increment_create_retries() {
    CREATE_RETRIES_TOTAL.inc();
}

