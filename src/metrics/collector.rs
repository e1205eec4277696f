//! Collectors turning raw counters into derived metrics.

use crate::metrics::{
    data::*,
    traits::{Collector, CounterSource},
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, warn};

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 100.0 / whole as f64).clamp(0.0, 100.0)
}

/// CPU time split between system, user and idle.
///
/// Needs two tick samples before it can emit anything.
#[derive(Debug, Clone)]
pub struct CpuCollector {
    previous_ticks: Option<CpuTicks>,
    last_emitted: Reading<CpuUsage>,
    last_good: Option<CpuUsage>,
}

impl Default for CpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuCollector {
    pub fn new() -> Self {
        Self {
            previous_ticks: None,
            last_emitted: Reading::WarmingUp,
            last_good: None,
        }
    }

    /// The last value accepted as plausible.
    pub fn last_good(&self) -> Option<CpuUsage> {
        self.last_good
    }

    /// Apply the stability policy to a freshly computed split.
    ///
    /// An exact all-zero split is a known artifact of rapid successive reads;
    /// it is replaced by the last good value, which stays untouched. Splits
    /// derived from tick deltas here always sum to 100, so this only fires for
    /// readers that hand over pre-rounded zero percentages. A truly idle CPU
    /// reads as 100% idle, but a host reporting all-zero ticks for real would
    /// be masked here.
    fn accept(&mut self, computed: CpuUsage) -> Reading<CpuUsage> {
        if computed.is_all_zero() {
            debug!("All-zero cpu split, reusing last good value");
            return match self.last_good {
                Some(good) => Reading::Ready(good),
                None => self.last_emitted.clone(),
            };
        }

        self.last_good = Some(computed);
        Reading::Ready(computed)
    }

    fn derive(&mut self, ticks: CpuTicks) -> Reading<CpuUsage> {
        let Some(previous) = self.previous_ticks.replace(ticks) else {
            debug!("First cpu sample, warming up");
            return Reading::WarmingUp;
        };

        // Each mode is floored independently so one rolled-over counter
        // cannot drag the others negative.
        let system = ticks.system.saturating_sub(previous.system);
        let user = ticks.user.saturating_sub(previous.user);
        let idle = ticks.idle.saturating_sub(previous.idle);
        let total = system.saturating_add(user).saturating_add(idle);

        if total == 0 {
            debug!("No cpu ticks elapsed, repeating previous value");
            return self.last_emitted.clone();
        }

        self.accept(CpuUsage {
            system_pct: percent(system, total),
            user_pct: percent(user, total),
            idle_pct: percent(idle, total),
        })
    }
}

impl Collector for CpuCollector {
    fn kind(&self) -> MetricKind {
        MetricKind::Cpu
    }

    fn update(&mut self, source: &dyn CounterSource, _now: Instant) -> DerivedMetric {
        let reading = match source.cpu_ticks() {
            Ok(ticks) => self.derive(ticks),
            Err(err) => {
                warn!("Failed to read cpu ticks: {}", err);
                Reading::Unavailable
            }
        };

        self.last_emitted = reading.clone();
        DerivedMetric::Cpu(reading)
    }
}

/// Memory pressure, derived fresh on every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryCollector;

impl MemoryCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn derive(counters: MemoryCounters) -> Reading<MemoryUsage> {
        if counters.total_bytes == 0 {
            return Reading::Unavailable;
        }

        let used = counters
            .app_bytes
            .saturating_add(counters.wired_bytes)
            .saturating_add(counters.compressed_bytes);

        Reading::Ready(MemoryUsage {
            app_bytes: counters.app_bytes,
            wired_bytes: counters.wired_bytes,
            compressed_bytes: counters.compressed_bytes,
            total_bytes: counters.total_bytes,
            used_pct: percent(used, counters.total_bytes),
        })
    }
}

impl Collector for MemoryCollector {
    fn kind(&self) -> MetricKind {
        MetricKind::Memory
    }

    fn update(&mut self, source: &dyn CounterSource, _now: Instant) -> DerivedMetric {
        let reading = match source.memory_counters() {
            Ok(counters) => Self::derive(counters),
            Err(err) => {
                warn!("Failed to read memory counters: {}", err);
                Reading::Unavailable
            }
        };
        DerivedMetric::Memory(reading)
    }
}

/// Capacity of the volume holding a path.
///
/// A failed read is reported as unavailable rather than repeating old numbers.
#[derive(Debug, Clone)]
pub struct DiskCollector {
    path: PathBuf,
}

impl DiskCollector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn derive(space: DiskSpace) -> Reading<DiskUsage> {
        if space.total_bytes == 0 {
            return Reading::Unavailable;
        }

        Reading::Ready(DiskUsage {
            total_bytes: space.total_bytes,
            used_bytes: space.used_bytes,
            free_bytes: space.free_bytes,
            used_pct: percent(space.used_bytes, space.total_bytes),
        })
    }
}

impl Collector for DiskCollector {
    fn kind(&self) -> MetricKind {
        MetricKind::Disk
    }

    fn update(&mut self, source: &dyn CounterSource, _now: Instant) -> DerivedMetric {
        let reading = match source.disk_usage(&self.path) {
            Ok(space) => Self::derive(space),
            Err(err) => {
                warn!("Failed to read disk usage for {}: {}", self.path.display(), err);
                Reading::Unavailable
            }
        };
        DerivedMetric::Disk(reading)
    }
}

/// State of the internal battery; hosts without one report unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatteryCollector;

impl BatteryCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn derive(battery: Option<BatteryReading>) -> Reading<BatteryStatus> {
        let Some(battery) = battery else {
            return Reading::Unavailable;
        };
        if !battery.charge_pct.is_finite() {
            warn!("Battery reported a non-numeric charge");
            return Reading::Unavailable;
        }

        let time_left = match battery.time_left_minutes {
            Some(minutes) if minutes >= 0 => TimeLeft::Minutes(minutes as u32),
            _ => TimeLeft::Indeterminate,
        };

        Reading::Ready(BatteryStatus {
            charge_pct: f64::from(battery.charge_pct).clamp(0.0, 100.0),
            cycle_count: battery.cycle_count,
            temperature_c: battery.temperature_c,
            time_left,
        })
    }
}

impl Collector for BatteryCollector {
    fn kind(&self) -> MetricKind {
        MetricKind::Battery
    }

    fn update(&mut self, source: &dyn CounterSource, _now: Instant) -> DerivedMetric {
        DerivedMetric::Battery(Self::derive(source.battery()))
    }
}
