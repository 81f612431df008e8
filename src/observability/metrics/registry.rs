//! # Metrics Registry
//!
//! Process-wide Prometheus registry shared by every metric in the crate.

use prometheus::Registry;
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);
