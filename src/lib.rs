//! # host_pulse - Host Telemetry Sampling Engine
//!
//! Stateful collectors that read raw operating system counters and turn them
//! into user-facing metrics for a menu-bar style monitor: CPU time split,
//! memory pressure, disk capacity, battery state and network throughput.
//!
//! ## Features
//!
//! - **Delta-aware collectors**: CPU percentages and network rates computed
//!   across polling ticks, with counter resets reported as zero
//! - **Stable output**: transient all-zero CPU readings replaced by the last
//!   good value; absent batteries and interfaces reported as unavailable
//! - **Independent cadences**: fast (CPU, memory, network), battery and disk
//! - **Pull and push**: current values and per-kind callbacks via [`MetricHub`]
//! - **Display strings**: every field always renders, e.g. `"2.00 KB/s"` or `"N/D"`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use host_pulse::{EngineConfig, HostCounters, MetricHub, MetricKind, PollScheduler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = Arc::new(MetricHub::new());
//!     hub.subscribe(MetricKind::Cpu, |metric| {
//!         for field in metric.render() {
//!             println!("cpu {}: {}", field.name, field.value);
//!         }
//!     });
//!
//!     let scheduler = PollScheduler::start(
//!         &EngineConfig::default(),
//!         Arc::new(HostCounters::new()),
//!         Arc::clone(&hub),
//!     )?;
//!     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//!     scheduler.stop().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod indicator;
pub mod metrics;
pub mod scheduler;

// Re-export public API
pub use config::EngineConfig;
pub use error::{Result, TelemetryError};
pub use format::{format_bytes, format_percent, format_rate, format_temperature, format_time_left};
pub use metrics::{
    data::{
        BatteryStatus, CpuUsage, DiskUsage, Field, MemoryUsage, NetworkThroughput, TimeLeft,
    },
    rate::{rate, RateCounter, Sample},
    scripted::ScriptedCounters,
    Collector, CounterSource, DerivedMetric, HostCounters, MetricKind, Reading,
};
pub use scheduler::{Cadence, MetricHub, PollScheduler};

/// The default period of the CPU, memory and network cadence in milliseconds
pub const DEFAULT_FAST_PERIOD_MS: u64 = 1000;

/// The default period of the battery cadence in seconds
pub const DEFAULT_BATTERY_PERIOD_SECS: u64 = 60;

/// The default period of the disk cadence in seconds
pub const DEFAULT_DISK_PERIOD_SECS: u64 = 300;

/// The default monitored network interface
#[cfg(target_os = "macos")]
pub const DEFAULT_INTERFACE: &str = "en0";

/// The default monitored network interface
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_INTERFACE: &str = "eth0";

/// The default path whose volume is reported
pub const DEFAULT_DISK_PATH: &str = "/";
