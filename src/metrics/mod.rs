//! Telemetry collection and data structures.
//!
//! This module provides the raw counter reader seam, the host implementation
//! behind it, the rate calculator, and the collectors that turn raw counters
//! into CPU, memory, disk, battery and network metrics.

pub mod collector;
pub mod data;
pub mod host;
pub mod network;
pub mod rate;
pub mod scripted;
pub mod traits;

// Re-export commonly used items
pub use collector::{BatteryCollector, CpuCollector, DiskCollector, MemoryCollector};
pub use data::{DerivedMetric, MetricKind, Reading};
pub use host::HostCounters;
pub use network::NetworkCollector;
pub use traits::{Collector, CounterSource};
