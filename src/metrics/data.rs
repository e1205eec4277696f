//! Data structures for raw counters and derived metrics.

use crate::format;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Cumulative CPU ticks, folded into three modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTicks {
    pub system: u64,
    pub user: u64,
    pub idle: u64,
}

/// Memory counters in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCounters {
    /// Anonymous memory owned by processes
    pub app_bytes: u64,
    /// Memory the kernel cannot page out
    pub wired_bytes: u64,
    /// Memory held in the compressed pool
    pub compressed_bytes: u64,
    /// Physical memory installed
    pub total_bytes: u64,
}

/// Capacity of one volume in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpace {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

/// A one-shot battery query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryReading {
    pub charge_pct: f32,
    pub cycle_count: u32,
    pub temperature_c: Option<f32>,
    /// `None` when the host offers no estimate
    pub time_left_minutes: Option<i32>,
}

/// Cumulative byte counters of one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// The metric families produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Cpu,
    Memory,
    Disk,
    Battery,
    Network,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Cpu,
        MetricKind::Memory,
        MetricKind::Disk,
        MetricKind::Battery,
        MetricKind::Network,
    ];

    /// Names of the rendered fields, in display order.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            MetricKind::Cpu => &["system", "user", "idle", "busy"],
            MetricKind::Memory => &["app", "wired", "compressed", "usage"],
            MetricKind::Disk => &["total", "used", "free", "usage"],
            MetricKind::Battery => &["charge", "cycles", "temperature", "time_left"],
            MetricKind::Network => &["address", "upload", "download"],
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Memory => "memory",
            MetricKind::Disk => "disk",
            MetricKind::Battery => "battery",
            MetricKind::Network => "network",
        };
        f.pad(name)
    }
}

/// The state of one collector's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Reading<T> {
    /// No delta can be computed yet
    WarmingUp,
    /// A derived value
    Ready(T),
    /// The resource is absent or could not be read this tick
    Unavailable,
}

impl<T> Reading<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Reading::Ready(_))
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Reading::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// CPU time split over one polling interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    pub system_pct: f64,
    pub user_pct: f64,
    pub idle_pct: f64,
}

impl CpuUsage {
    /// Share of time spent outside the idle task.
    pub fn busy_pct(&self) -> f64 {
        (self.system_pct + self.user_pct).clamp(0.0, 100.0)
    }

    pub fn is_all_zero(&self) -> bool {
        self.system_pct == 0.0 && self.user_pct == 0.0 && self.idle_pct == 0.0
    }
}

/// Memory pressure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub app_bytes: u64,
    pub wired_bytes: u64,
    pub compressed_bytes: u64,
    pub total_bytes: u64,
    pub used_pct: f64,
}

/// Capacity of the monitored volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub used_pct: f64,
}

/// Remaining battery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeLeft {
    Minutes(u32),
    Indeterminate,
}

/// State of the internal battery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    pub charge_pct: f64,
    pub cycle_count: u32,
    pub temperature_c: Option<f32>,
    pub time_left: TimeLeft,
}

/// Throughput of the monitored interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkThroughput {
    pub interface: String,
    pub local_address: Option<Ipv4Addr>,
    pub upload_bytes_per_sec: f64,
    pub download_bytes_per_sec: f64,
}

/// A derived metric as published to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reading", rename_all = "snake_case")]
pub enum DerivedMetric {
    Cpu(Reading<CpuUsage>),
    Memory(Reading<MemoryUsage>),
    Disk(Reading<DiskUsage>),
    Battery(Reading<BatteryStatus>),
    Network(Reading<NetworkThroughput>),
}

/// One rendered label/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub value: String,
}

impl DerivedMetric {
    /// The state every kind is in before its first tick.
    pub fn warming_up(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Cpu => DerivedMetric::Cpu(Reading::WarmingUp),
            MetricKind::Memory => DerivedMetric::Memory(Reading::WarmingUp),
            MetricKind::Disk => DerivedMetric::Disk(Reading::WarmingUp),
            MetricKind::Battery => DerivedMetric::Battery(Reading::WarmingUp),
            MetricKind::Network => DerivedMetric::Network(Reading::WarmingUp),
        }
    }

    pub fn unavailable(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Cpu => DerivedMetric::Cpu(Reading::Unavailable),
            MetricKind::Memory => DerivedMetric::Memory(Reading::Unavailable),
            MetricKind::Disk => DerivedMetric::Disk(Reading::Unavailable),
            MetricKind::Battery => DerivedMetric::Battery(Reading::Unavailable),
            MetricKind::Network => DerivedMetric::Network(Reading::Unavailable),
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            DerivedMetric::Cpu(_) => MetricKind::Cpu,
            DerivedMetric::Memory(_) => MetricKind::Memory,
            DerivedMetric::Disk(_) => MetricKind::Disk,
            DerivedMetric::Battery(_) => MetricKind::Battery,
            DerivedMetric::Network(_) => MetricKind::Network,
        }
    }

    pub fn is_ready(&self) -> bool {
        match self {
            DerivedMetric::Cpu(r) => r.is_ready(),
            DerivedMetric::Memory(r) => r.is_ready(),
            DerivedMetric::Disk(r) => r.is_ready(),
            DerivedMetric::Battery(r) => r.is_ready(),
            DerivedMetric::Network(r) => r.is_ready(),
        }
    }

    pub fn is_warming_up(&self) -> bool {
        matches!(
            self,
            DerivedMetric::Cpu(Reading::WarmingUp)
                | DerivedMetric::Memory(Reading::WarmingUp)
                | DerivedMetric::Disk(Reading::WarmingUp)
                | DerivedMetric::Battery(Reading::WarmingUp)
                | DerivedMetric::Network(Reading::WarmingUp)
        )
    }

    pub fn is_unavailable(&self) -> bool {
        !self.is_ready() && !self.is_warming_up()
    }

    /// Render every field of this metric as a display string.
    ///
    /// The field list is fixed per kind, so a consumer always receives the
    /// same labels whether the reading is ready, warming up, or unavailable.
    pub fn render(&self) -> Vec<Field> {
        let names = self.kind().field_names();
        let values = match self {
            DerivedMetric::Cpu(Reading::Ready(cpu)) => vec![
                format::format_percent(cpu.system_pct),
                format::format_percent(cpu.user_pct),
                format::format_percent(cpu.idle_pct),
                format::format_percent(cpu.busy_pct()),
            ],
            DerivedMetric::Memory(Reading::Ready(mem)) => vec![
                format::format_bytes(mem.app_bytes),
                format::format_bytes(mem.wired_bytes),
                format::format_bytes(mem.compressed_bytes),
                format::format_percent(mem.used_pct),
            ],
            DerivedMetric::Disk(Reading::Ready(disk)) => vec![
                format::format_bytes(disk.total_bytes),
                format::format_bytes(disk.used_bytes),
                format::format_bytes(disk.free_bytes),
                format::format_percent(disk.used_pct),
            ],
            DerivedMetric::Battery(Reading::Ready(battery)) => vec![
                format::format_percent(battery.charge_pct),
                battery.cycle_count.to_string(),
                battery
                    .temperature_c
                    .map(format::format_temperature)
                    .unwrap_or_else(|| format::UNAVAILABLE.to_string()),
                format::format_time_left(battery.time_left),
            ],
            DerivedMetric::Network(Reading::Ready(net)) => vec![
                net.local_address
                    .map(|addr| addr.to_string())
                    .unwrap_or_else(|| format::NO_ADDRESS.to_string()),
                format::format_rate(net.upload_bytes_per_sec),
                format::format_rate(net.download_bytes_per_sec),
            ],
            other => {
                let placeholder = if other.is_warming_up() {
                    format::WARMING_UP
                } else {
                    format::UNAVAILABLE
                };
                vec![placeholder.to_string(); names.len()]
            }
        };

        names
            .iter()
            .zip(values)
            .map(|(&name, value)| Field { name, value })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_renders_its_field_list() {
        for kind in MetricKind::ALL {
            for metric in [DerivedMetric::warming_up(kind), DerivedMetric::unavailable(kind)] {
                let fields = metric.render();
                assert_eq!(fields.len(), kind.field_names().len());
                assert!(fields.iter().all(|f| !f.value.is_empty()));
            }
        }
    }

    #[test]
    fn test_placeholders() {
        let fields = DerivedMetric::warming_up(MetricKind::Cpu).render();
        assert!(fields.iter().all(|f| f.value == format::WARMING_UP));

        let fields = DerivedMetric::unavailable(MetricKind::Battery).render();
        assert!(fields.iter().all(|f| f.value == format::UNAVAILABLE));
    }

    #[test]
    fn test_network_without_address() {
        let metric = DerivedMetric::Network(Reading::Ready(NetworkThroughput {
            interface: "eth0".to_string(),
            local_address: None,
            upload_bytes_per_sec: 500.0,
            download_bytes_per_sec: 2048.0,
        }));
        let fields = metric.render();
        assert_eq!(fields[0].value, format::NO_ADDRESS);
        assert_eq!(fields[1].value, "500.00 B/s");
        assert_eq!(fields[2].value, "2.00 KB/s");
    }

    #[test]
    fn test_battery_without_temperature() {
        let metric = DerivedMetric::Battery(Reading::Ready(BatteryStatus {
            charge_pct: 87.0,
            cycle_count: 312,
            temperature_c: None,
            time_left: TimeLeft::Minutes(95),
        }));
        let values: Vec<_> = metric.render().into_iter().map(|f| f.value).collect();
        assert_eq!(values, ["87.0%", "312", format::UNAVAILABLE, "1:35"]);
    }

    #[test]
    fn test_json_shape() {
        let metric = DerivedMetric::Cpu(Reading::Ready(CpuUsage {
            system_pct: 10.0,
            user_pct: 20.0,
            idle_pct: 70.0,
        }));
        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["kind"], "cpu");
        assert_eq!(json["reading"]["state"], "ready");
        assert_eq!(json["reading"]["value"]["idle_pct"], 70.0);

        let back: DerivedMetric = serde_json::from_value(json).unwrap();
        assert_eq!(back, metric);
    }
}
