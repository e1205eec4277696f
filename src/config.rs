//! Engine configuration.

use crate::error::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration consumed by the poll scheduler and the collectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Preferred network interface to monitor
    pub interface: String,
    /// Fall back to the host's first active IPv4 interface when the
    /// preferred one is missing
    pub auto_detect_interface: bool,
    /// Path whose volume is reported by the disk collector
    pub disk_path: PathBuf,
    /// Period of the CPU, memory and network cadence
    pub fast_period: Duration,
    /// Period of the battery cadence
    pub battery_period: Duration,
    /// Period of the disk cadence
    pub disk_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interface: crate::DEFAULT_INTERFACE.to_string(),
            auto_detect_interface: true,
            disk_path: PathBuf::from(crate::DEFAULT_DISK_PATH),
            fast_period: Duration::from_millis(crate::DEFAULT_FAST_PERIOD_MS),
            battery_period: Duration::from_secs(crate::DEFAULT_BATTERY_PERIOD_SECS),
            disk_period: Duration::from_secs(crate::DEFAULT_DISK_PERIOD_SECS),
        }
    }
}

impl EngineConfig {
    /// Create a configuration monitoring the given interface.
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            ..Default::default()
        }
    }

    /// Set the preferred network interface.
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Enable or disable interface auto-detection.
    pub fn with_auto_detect_interface(mut self, enabled: bool) -> Self {
        self.auto_detect_interface = enabled;
        self
    }

    /// Set the path whose volume the disk collector reports.
    pub fn with_disk_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.disk_path = path.into();
        self
    }

    /// Set the fast cadence period.
    pub fn with_fast_period(mut self, period: Duration) -> Self {
        self.fast_period = period;
        self
    }

    /// Set the battery cadence period.
    pub fn with_battery_period(mut self, period: Duration) -> Self {
        self.battery_period = period;
        self
    }

    /// Set the disk cadence period.
    pub fn with_disk_period(mut self, period: Duration) -> Self {
        self.disk_period = period;
        self
    }

    /// Check the configuration before any trigger is scheduled.
    pub fn validate(&self) -> Result<()> {
        if self.interface.trim().is_empty() {
            return Err(TelemetryError::config_error("interface name is empty"));
        }

        let periods = [
            ("fast", self.fast_period),
            ("battery", self.battery_period),
            ("disk", self.disk_period),
        ];
        for (name, period) in periods {
            if period.is_zero() {
                return Err(TelemetryError::config_error(format!(
                    "{name} period must be greater than zero"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cadences() {
        let config = EngineConfig::default();
        assert_eq!(config.fast_period, Duration::from_secs(1));
        assert_eq!(config.battery_period, Duration::from_secs(60));
        assert_eq!(config.disk_period, Duration::from_secs(300));
        assert_eq!(config.interface, crate::DEFAULT_INTERFACE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = EngineConfig::default().with_disk_period(Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("disk period"));
    }

    #[test]
    fn test_blank_interface_rejected() {
        let config = EngineConfig::new("  ");
        assert!(matches!(config.validate(), Err(TelemetryError::Config(_))));
    }
}
