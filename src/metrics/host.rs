//! Counter reads against the running host.
//!
//! CPU ticks and the memory breakdown come straight from `/proc`, battery
//! state from `/sys/class/power_supply`, capacities and interface totals from
//! sysinfo, and addresses from pnet.

use crate::error::{Result, TelemetryError};
use crate::metrics::data::*;
use crate::metrics::traits::CounterSource;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sysinfo::{Disks, Networks, System};
use tracing::{debug, trace};

/// Counter source backed by the operating system.
pub struct HostCounters {
    system: Mutex<System>,
    proc_root: PathBuf,
    power_supply_root: PathBuf,
}

impl Default for HostCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCounters {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            proc_root: PathBuf::from("/proc"),
            power_supply_root: PathBuf::from("/sys/class/power_supply"),
        }
    }

    /// Read `stat` and `meminfo` below another directory.
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    /// Look for batteries below another directory.
    pub fn with_power_supply_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.power_supply_root = root.into();
        self
    }

    /// Memory counters from sysinfo alone, for hosts without `/proc/meminfo`.
    fn sysinfo_memory(&self) -> Result<MemoryCounters> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| TelemetryError::system_error("memory reader lock poisoned"))?;
        system.refresh_memory();

        let total_bytes = system.total_memory();
        if total_bytes == 0 {
            return Err(TelemetryError::unavailable_error("total memory not reported"));
        }

        Ok(MemoryCounters {
            app_bytes: system.used_memory(),
            wired_bytes: 0,
            compressed_bytes: 0,
            total_bytes,
        })
    }
}

impl CounterSource for HostCounters {
    fn cpu_ticks(&self) -> Result<CpuTicks> {
        let stat = fs::read_to_string(self.proc_root.join("stat"))?;
        parse_cpu_ticks(&stat)
    }

    fn memory_counters(&self) -> Result<MemoryCounters> {
        match fs::read_to_string(self.proc_root.join("meminfo")) {
            Ok(meminfo) => parse_meminfo(&meminfo),
            Err(err) => {
                trace!("meminfo unreadable ({err}), using sysinfo totals");
                self.sysinfo_memory()
            }
        }
    }

    fn disk_usage(&self, path: &Path) -> Result<DiskSpace> {
        let disks = Disks::new_with_refreshed_list();

        // The volume holding `path` is the one with the longest matching mount point.
        let disk = disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .ok_or_else(|| {
                TelemetryError::unavailable_error(format!("no volume mounted for {}", path.display()))
            })?;

        let total_bytes = disk.total_space();
        if total_bytes == 0 {
            return Err(TelemetryError::unavailable_error(format!(
                "{} reports zero capacity",
                disk.mount_point().display()
            )));
        }
        let free_bytes = disk.available_space();

        Ok(DiskSpace {
            total_bytes,
            used_bytes: total_bytes.saturating_sub(free_bytes),
            free_bytes,
        })
    }

    fn battery(&self) -> Option<BatteryReading> {
        read_battery(&self.power_supply_root)
    }

    fn interface_counters(&self, name: &str) -> Option<InterfaceCounters> {
        let networks = Networks::new_with_refreshed_list();
        networks.list().get(name).map(|data| InterfaceCounters {
            rx_bytes: data.total_received(),
            tx_bytes: data.total_transmitted(),
        })
    }

    fn local_address(&self, name: &str) -> Option<Ipv4Addr> {
        pnet::datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == name)
            .and_then(|iface| first_ipv4(&iface))
    }

    fn default_interface(&self) -> Option<String> {
        let interface = pnet::datalink::interfaces().into_iter().find(|iface| {
            iface.is_up()
                && !iface.is_loopback()
                && !iface.name.contains("docker")
                && first_ipv4(iface).is_some()
        })?;
        debug!("Found default interface: {}", interface.name);
        Some(interface.name)
    }
}

fn first_ipv4(iface: &pnet::datalink::NetworkInterface) -> Option<Ipv4Addr> {
    iface.ips.iter().find_map(|network| match network {
        pnet::ipnetwork::IpNetwork::V4(v4) => Some(v4.ip()),
        pnet::ipnetwork::IpNetwork::V6(_) => None,
    })
}

/// Fold the aggregate `cpu` line of `/proc/stat` into three modes.
///
/// Time spent servicing interrupts and stolen by a hypervisor counts as
/// system time; iowait counts as idle. Guest time is already part of user.
pub fn parse_cpu_ticks(stat: &str) -> Result<CpuTicks> {
    let line = stat
        .lines()
        .find(|line| line.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| TelemetryError::parse_error("no aggregate cpu line"))?;

    let fields = line
        .split_whitespace()
        .skip(1)
        .map(str::parse::<u64>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| TelemetryError::parse_error(format!("invalid cpu tick value: {e}")))?;

    if fields.len() < 4 {
        return Err(TelemetryError::parse_error(format!(
            "expected at least 4 cpu fields, found {}",
            fields.len()
        )));
    }

    let field = |i: usize| fields.get(i).copied().unwrap_or(0);
    let (user, nice, system, idle) = (field(0), field(1), field(2), field(3));
    let (iowait, irq, softirq, steal) = (field(4), field(5), field(6), field(7));

    Ok(CpuTicks {
        system: system
            .saturating_add(irq)
            .saturating_add(softirq)
            .saturating_add(steal),
        user: user.saturating_add(nice),
        idle: idle.saturating_add(iowait),
    })
}

/// Derive the memory breakdown from `/proc/meminfo`.
///
/// Missing keys count as zero; `MemTotal` is required.
pub fn parse_meminfo(meminfo: &str) -> Result<MemoryCounters> {
    let mut total_bytes = None;
    let mut app_bytes = 0;
    let mut wired_bytes: u64 = 0;
    let mut compressed_bytes = 0;

    for line in meminfo.lines() {
        let Some((key, value_str)) = line.split_once(':') else {
            continue;
        };
        let Some(Ok(kb)) = value_str.split_whitespace().next().map(str::parse::<u64>) else {
            continue;
        };
        let bytes = kb.saturating_mul(1024);

        match key {
            "MemTotal" => total_bytes = Some(bytes),
            "AnonPages" => app_bytes = bytes,
            "SUnreclaim" | "KernelStack" | "PageTables" | "Unevictable" => {
                wired_bytes = wired_bytes.saturating_add(bytes)
            }
            "Zswap" => compressed_bytes = bytes,
            _ => {}
        }
    }

    let total_bytes = total_bytes
        .filter(|total| *total > 0)
        .ok_or_else(|| TelemetryError::parse_error("MemTotal missing from meminfo"))?;

    Ok(MemoryCounters {
        app_bytes,
        wired_bytes,
        compressed_bytes,
        total_bytes,
    })
}

fn read_trimmed(dir: &Path, name: &str) -> Option<String> {
    fs::read_to_string(dir.join(name))
        .ok()
        .map(|s| s.trim().to_string())
}

fn read_number(dir: &Path, name: &str) -> Option<i64> {
    read_trimmed(dir, name)?.parse().ok()
}

/// Find the first battery below a `power_supply` directory and read it.
pub fn read_battery(root: &Path) -> Option<BatteryReading> {
    let mut supplies = fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    supplies.sort();

    let dir = supplies.into_iter().find(|dir| {
        read_trimmed(dir, "type").as_deref() == Some("Battery")
            && read_trimmed(dir, "present").as_deref() != Some("0")
    })?;

    // energy_* (µWh, µW) and charge_* (µAh, µA) pairs share a ratio.
    let (now, full, draw) = match read_number(&dir, "energy_now") {
        Some(now) => (
            Some(now),
            read_number(&dir, "energy_full"),
            read_number(&dir, "power_now"),
        ),
        None => (
            read_number(&dir, "charge_now"),
            read_number(&dir, "charge_full"),
            read_number(&dir, "current_now"),
        ),
    };

    let charge_pct = match read_number(&dir, "capacity") {
        Some(capacity) => capacity as f32,
        None => match (now, full) {
            (Some(now), Some(full)) if full > 0 => now as f32 * 100.0 / full as f32,
            _ => return None,
        },
    };

    let status = read_trimmed(&dir, "status").unwrap_or_default();
    let time_left_minutes = estimate_minutes(&status, now, full, draw.map(i64::abs));

    Some(BatteryReading {
        charge_pct,
        cycle_count: read_number(&dir, "cycle_count")
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        temperature_c: read_number(&dir, "temp").map(|tenths| tenths as f32 / 10.0),
        time_left_minutes,
    })
}

fn estimate_minutes(
    status: &str,
    now: Option<i64>,
    full: Option<i64>,
    draw: Option<i64>,
) -> Option<i32> {
    let draw = draw.filter(|d| *d > 0)? as f64;
    let now = now? as f64;

    let hours = match status {
        "Discharging" => now / draw,
        "Charging" => (full? as f64 - now).max(0.0) / draw,
        _ => return None,
    };

    Some((hours * 60.0).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  10132153 290696 3084719 46828483 16683 0 25195 0 175628 0\n\
                        cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0\n\
                        intr 199292 0 0\n\
                        ctxt 1990473\n";

    #[test]
    fn test_parse_cpu_ticks_folds_modes() {
        let ticks = parse_cpu_ticks(STAT).unwrap();
        assert_eq!(ticks.user, 10132153 + 290696);
        assert_eq!(ticks.system, 3084719 + 25195);
        assert_eq!(ticks.idle, 46828483 + 16683);
    }

    #[test]
    fn test_parse_cpu_ticks_short_line() {
        let ticks = parse_cpu_ticks("cpu 1 2 3 4\n").unwrap();
        assert_eq!(ticks, CpuTicks { system: 3, user: 3, idle: 4 });
    }

    #[test]
    fn test_parse_cpu_ticks_saturates() {
        let max = u64::MAX;
        let stat = format!("cpu {max} {max} {max} {max} {max} {max} {max} {max}\n");
        let ticks = parse_cpu_ticks(&stat).unwrap();
        assert_eq!(ticks, CpuTicks { system: max, user: max, idle: max });
    }

    #[test]
    fn test_parse_cpu_ticks_rejects_garbage() {
        assert!(parse_cpu_ticks("cpu0 1 2 3 4\n").is_err());
        assert!(parse_cpu_ticks("cpu 1 2 x 4\n").is_err());
        assert!(parse_cpu_ticks("cpu 1 2\n").is_err());
    }

    #[test]
    fn test_parse_meminfo() {
        let meminfo = "MemTotal:       16000000 kB\n\
                       MemFree:         2000000 kB\n\
                       AnonPages:       6000000 kB\n\
                       KernelStack:       20000 kB\n\
                       PageTables:        80000 kB\n\
                       SUnreclaim:       300000 kB\n\
                       Unevictable:      100000 kB\n\
                       Zswap:            250000 kB\n";
        let counters = parse_meminfo(meminfo).unwrap();
        assert_eq!(counters.total_bytes, 16000000 * 1024);
        assert_eq!(counters.app_bytes, 6000000 * 1024);
        assert_eq!(counters.wired_bytes, 500000 * 1024);
        assert_eq!(counters.compressed_bytes, 250000 * 1024);
    }

    #[test]
    fn test_parse_meminfo_saturates() {
        let max = u64::MAX;
        let meminfo = format!("MemTotal: {max} kB\nKernelStack: {max} kB\nPageTables: 1 kB\n");
        let counters = parse_meminfo(&meminfo).unwrap();
        assert_eq!(counters.total_bytes, max);
        assert_eq!(counters.wired_bytes, max);
    }

    #[test]
    fn test_parse_meminfo_without_total() {
        assert!(parse_meminfo("MemFree: 100 kB\n").is_err());
    }

    fn write_supply(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, contents) in files {
            fs::write(dir.join(file), format!("{contents}\n")).unwrap();
        }
    }

    #[test]
    fn test_read_battery_discharging() {
        let root = tempfile::tempdir().unwrap();
        write_supply(root.path(), "AC", &[("type", "Mains"), ("online", "0")]);
        write_supply(
            root.path(),
            "BAT0",
            &[
                ("type", "Battery"),
                ("status", "Discharging"),
                ("capacity", "80"),
                ("cycle_count", "412"),
                ("temp", "312"),
                ("energy_now", "40000000"),
                ("energy_full", "50000000"),
                ("power_now", "10000000"),
            ],
        );

        let battery = read_battery(root.path()).unwrap();
        assert_eq!(battery.charge_pct, 80.0);
        assert_eq!(battery.cycle_count, 412);
        assert_eq!(battery.temperature_c, Some(31.2));
        assert_eq!(battery.time_left_minutes, Some(240));
    }

    #[test]
    fn test_read_battery_full_has_no_estimate() {
        let root = tempfile::tempdir().unwrap();
        write_supply(
            root.path(),
            "BAT1",
            &[
                ("type", "Battery"),
                ("status", "Full"),
                ("charge_now", "3000000"),
                ("charge_full", "3000000"),
                ("current_now", "0"),
            ],
        );

        let battery = read_battery(root.path()).unwrap();
        assert_eq!(battery.charge_pct, 100.0);
        assert_eq!(battery.cycle_count, 0);
        assert_eq!(battery.temperature_c, None);
        assert_eq!(battery.time_left_minutes, None);
    }

    #[test]
    fn test_read_battery_absent() {
        let root = tempfile::tempdir().unwrap();
        write_supply(root.path(), "AC", &[("type", "Mains")]);
        assert!(read_battery(root.path()).is_none());
        assert!(read_battery(&root.path().join("missing")).is_none());
    }

    #[test]
    fn test_host_counters_with_fake_proc() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("stat"), STAT).unwrap();
        fs::write(root.path().join("meminfo"), "MemTotal: 1024 kB\nAnonPages: 512 kB\n").unwrap();

        let host = HostCounters::new().with_proc_root(root.path());
        assert_eq!(host.cpu_ticks().unwrap().idle, 46828483 + 16683);
        let memory = host.memory_counters().unwrap();
        assert_eq!(memory.app_bytes, 512 * 1024);
        assert_eq!(memory.total_bytes, 1024 * 1024);
    }
}
