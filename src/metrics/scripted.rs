//! An in-memory counter source that replays scripted readings.
//!
//! Each queue hands out its entries in order and then keeps repeating the
//! last one, so a single entry behaves like a static host.

use crate::error::{Result, TelemetryError};
use crate::metrics::data::*;
use crate::metrics::traits::CounterSource;
use std::collections::{BTreeMap, VecDeque};
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// A scripted counter source for tests and benchmarks.
///
/// `None` entries in the CPU, memory and disk queues replay as read failures.
#[derive(Debug, Default)]
pub struct ScriptedCounters {
    script: Mutex<Script>,
}

#[derive(Debug, Default)]
struct Script {
    cpu: VecDeque<Option<CpuTicks>>,
    memory: VecDeque<Option<MemoryCounters>>,
    disk: VecDeque<Option<DiskSpace>>,
    battery: VecDeque<Option<BatteryReading>>,
    interfaces: BTreeMap<String, VecDeque<InterfaceCounters>>,
    addresses: BTreeMap<String, Ipv4Addr>,
    default_interface: Option<String>,
}

fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl ScriptedCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not hide the script from the others.
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_cpu(&self, ticks: Option<CpuTicks>) -> &Self {
        self.script().cpu.push_back(ticks);
        self
    }

    pub fn push_memory(&self, counters: Option<MemoryCounters>) -> &Self {
        self.script().memory.push_back(counters);
        self
    }

    pub fn push_disk(&self, space: Option<DiskSpace>) -> &Self {
        self.script().disk.push_back(space);
        self
    }

    pub fn push_battery(&self, battery: Option<BatteryReading>) -> &Self {
        self.script().battery.push_back(battery);
        self
    }

    pub fn push_interface(&self, name: &str, counters: InterfaceCounters) -> &Self {
        self.script()
            .interfaces
            .entry(name.to_string())
            .or_default()
            .push_back(counters);
        self
    }

    /// Make the named interface disappear.
    pub fn remove_interface(&self, name: &str) -> &Self {
        self.script().interfaces.remove(name);
        self
    }

    pub fn set_address(&self, name: &str, address: Ipv4Addr) -> &Self {
        self.script().addresses.insert(name.to_string(), address);
        self
    }

    pub fn set_default_interface(&self, name: Option<&str>) -> &Self {
        self.script().default_interface = name.map(str::to_string);
        self
    }
}

impl CounterSource for ScriptedCounters {
    fn cpu_ticks(&self) -> Result<CpuTicks> {
        next(&mut self.script().cpu)
            .flatten()
            .ok_or_else(|| TelemetryError::system_error("scripted cpu read failed"))
    }

    fn memory_counters(&self) -> Result<MemoryCounters> {
        next(&mut self.script().memory)
            .flatten()
            .ok_or_else(|| TelemetryError::system_error("scripted memory read failed"))
    }

    fn disk_usage(&self, path: &Path) -> Result<DiskSpace> {
        next(&mut self.script().disk).flatten().ok_or_else(|| {
            TelemetryError::unavailable_error(format!("no scripted volume for {}", path.display()))
        })
    }

    fn battery(&self) -> Option<BatteryReading> {
        next(&mut self.script().battery).flatten()
    }

    fn interface_counters(&self, name: &str) -> Option<InterfaceCounters> {
        self.script().interfaces.get_mut(name).and_then(next)
    }

    fn local_address(&self, name: &str) -> Option<Ipv4Addr> {
        self.script().addresses.get(name).copied()
    }

    fn default_interface(&self) -> Option<String> {
        self.script().default_interface.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_entry_repeats() {
        let source = ScriptedCounters::new();
        source
            .push_interface("en0", InterfaceCounters { rx_bytes: 1, tx_bytes: 1 })
            .push_interface("en0", InterfaceCounters { rx_bytes: 2, tx_bytes: 2 });

        assert_eq!(source.interface_counters("en0").unwrap().rx_bytes, 1);
        assert_eq!(source.interface_counters("en0").unwrap().rx_bytes, 2);
        assert_eq!(source.interface_counters("en0").unwrap().rx_bytes, 2);
        assert!(source.interface_counters("wlan0").is_none());
    }

    #[test]
    fn test_empty_queues_fail() {
        let source = ScriptedCounters::new();
        assert!(source.cpu_ticks().is_err());
        assert!(source.disk_usage(Path::new("/")).is_err());
        assert!(source.battery().is_none());
    }
}
