//! Traits for raw counter reads and metric collection.

use crate::error::Result;
use crate::metrics::data::*;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Instant;

/// One-shot queries against the operating system's counters.
///
/// Implementations hold no delta state. Absence of a battery or an interface
/// is an expected state and is reported as `None`, never as an error.
pub trait CounterSource: Send + Sync {
    /// Cumulative CPU ticks since boot.
    fn cpu_ticks(&self) -> Result<CpuTicks>;

    /// Current memory counters.
    fn memory_counters(&self) -> Result<MemoryCounters>;

    /// Capacity of the volume holding `path`.
    fn disk_usage(&self, path: &Path) -> Result<DiskSpace>;

    /// The internal battery, if the host has one.
    fn battery(&self) -> Option<BatteryReading>;

    /// Cumulative byte counters of the named interface.
    fn interface_counters(&self, name: &str) -> Option<InterfaceCounters>;

    /// First IPv4 address bound to the named interface.
    fn local_address(&self, name: &str) -> Option<Ipv4Addr>;

    /// First up, non-loopback interface carrying an IPv4 address.
    fn default_interface(&self) -> Option<String>;
}

/// A stateful producer of one metric kind.
///
/// A collector is owned by exactly one cadence and is never updated
/// concurrently with itself.
pub trait Collector: Send {
    /// The kind this collector publishes.
    fn kind(&self) -> MetricKind;

    /// Read fresh counters and derive the next value.
    ///
    /// Read failures are absorbed into the returned reading.
    fn update(&mut self, source: &dyn CounterSource, now: Instant) -> DerivedMetric;
}
