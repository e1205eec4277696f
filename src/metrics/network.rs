//! Throughput of one monitored network interface.

use crate::metrics::{
    data::*,
    rate::{RateCounter, Sample},
    traits::{Collector, CounterSource},
};
use std::time::Instant;
use tracing::{debug, info};

/// Upload and download rates of a single interface.
///
/// The preferred interface wins whenever the host reports it. Otherwise the
/// host's default interface is used if auto-detection is on. Switching
/// interfaces discards the previous samples, since their counters are
/// unrelated.
#[derive(Debug, Clone)]
pub struct NetworkCollector {
    preferred: String,
    auto_detect: bool,
    monitored: Option<String>,
    upload: RateCounter,
    download: RateCounter,
}

impl NetworkCollector {
    pub fn new(preferred: impl Into<String>, auto_detect: bool) -> Self {
        Self {
            preferred: preferred.into(),
            auto_detect,
            monitored: None,
            upload: RateCounter::new(),
            download: RateCounter::new(),
        }
    }

    /// The interface sampled on the last tick, if any.
    pub fn monitored(&self) -> Option<&str> {
        self.monitored.as_deref()
    }

    fn resolve(&self, source: &dyn CounterSource) -> Option<(String, InterfaceCounters)> {
        if let Some(counters) = source.interface_counters(&self.preferred) {
            return Some((self.preferred.clone(), counters));
        }
        if !self.auto_detect {
            return None;
        }

        let name = source.default_interface()?;
        let counters = source.interface_counters(&name)?;
        Some((name, counters))
    }

    fn forget(&mut self) {
        self.upload.reset();
        self.download.reset();
    }
}

impl Collector for NetworkCollector {
    fn kind(&self) -> MetricKind {
        MetricKind::Network
    }

    fn update(&mut self, source: &dyn CounterSource, now: Instant) -> DerivedMetric {
        let Some((name, counters)) = self.resolve(source) else {
            if let Some(lost) = self.monitored.take() {
                info!("Network interface {} is gone", lost);
            }
            self.forget();
            return DerivedMetric::Network(Reading::Unavailable);
        };

        if self.monitored.as_deref() != Some(name.as_str()) {
            info!("Monitoring network interface {}", name);
            self.forget();
            self.monitored = Some(name.clone());
        }

        let local_address = source.local_address(&name);
        let upload = self.upload.observe(Sample::new(counters.tx_bytes, now));
        let download = self.download.observe(Sample::new(counters.rx_bytes, now));

        let reading = match (upload, download) {
            (Some(upload), Some(download)) => Reading::Ready(NetworkThroughput {
                interface: name,
                local_address,
                upload_bytes_per_sec: upload,
                download_bytes_per_sec: download,
            }),
            _ => {
                debug!("First sample of {}, warming up", name);
                Reading::WarmingUp
            }
        };

        DerivedMetric::Network(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::scripted::ScriptedCounters;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn counters(rx_bytes: u64, tx_bytes: u64) -> InterfaceCounters {
        InterfaceCounters { rx_bytes, tx_bytes }
    }

    fn throughput(metric: DerivedMetric) -> NetworkThroughput {
        match metric {
            DerivedMetric::Network(Reading::Ready(net)) => net,
            other => panic!("expected throughput, got {other:?}"),
        }
    }

    #[test]
    fn test_rate_over_one_second() {
        let source = ScriptedCounters::new();
        source
            .push_interface("en0", counters(1000, 500))
            .push_interface("en0", counters(3000, 1524))
            .set_address("en0", Ipv4Addr::new(192, 168, 1, 20));

        let mut collector = NetworkCollector::new("en0", false);
        let start = Instant::now();
        let first = collector.update(&source, start);
        assert_eq!(first, DerivedMetric::Network(Reading::WarmingUp));

        let net = throughput(collector.update(&source, start + Duration::from_secs(1)));
        assert_eq!(net.download_bytes_per_sec, 2000.0);
        assert_eq!(net.upload_bytes_per_sec, 1024.0);
        assert_eq!(net.local_address, Some(Ipv4Addr::new(192, 168, 1, 20)));
        assert_eq!(net.interface, "en0");
    }

    #[test]
    fn test_counter_reset_reports_zero() {
        let source = ScriptedCounters::new();
        source
            .push_interface("en0", counters(9000, 9000))
            .push_interface("en0", counters(10, 10));

        let mut collector = NetworkCollector::new("en0", false);
        let start = Instant::now();
        collector.update(&source, start);
        let net = throughput(collector.update(&source, start + Duration::from_secs(1)));
        assert_eq!(net.download_bytes_per_sec, 0.0);
        assert_eq!(net.upload_bytes_per_sec, 0.0);
    }

    #[test]
    fn test_missing_interface_is_unavailable() {
        let source = ScriptedCounters::new();
        source.set_default_interface(Some("wlan0"));

        let mut collector = NetworkCollector::new("en0", false);
        let metric = collector.update(&source, Instant::now());
        assert_eq!(metric, DerivedMetric::Network(Reading::Unavailable));
        assert_eq!(collector.monitored(), None);
    }

    #[test]
    fn test_falls_back_to_default_interface() {
        let source = ScriptedCounters::new();
        source
            .push_interface("wlan0", counters(0, 0))
            .push_interface("wlan0", counters(4096, 0))
            .set_default_interface(Some("wlan0"));

        let mut collector = NetworkCollector::new("en0", true);
        let start = Instant::now();
        collector.update(&source, start);
        assert_eq!(collector.monitored(), Some("wlan0"));

        let net = throughput(collector.update(&source, start + Duration::from_secs(2)));
        assert_eq!(net.download_bytes_per_sec, 2048.0);
        assert_eq!(net.local_address, None);
    }

    #[test]
    fn test_switching_interface_warms_up_again() {
        let source = ScriptedCounters::new();
        source
            .push_interface("wlan0", counters(100, 100))
            .set_default_interface(Some("wlan0"));

        let mut collector = NetworkCollector::new("en0", true);
        let start = Instant::now();
        collector.update(&source, start);
        assert!(collector.update(&source, start + Duration::from_secs(1)).is_ready());

        source.push_interface("en0", counters(5_000_000, 0));
        let metric = collector.update(&source, start + Duration::from_secs(2));
        assert_eq!(metric, DerivedMetric::Network(Reading::WarmingUp));
        assert_eq!(collector.monitored(), Some("en0"));
    }

    #[test]
    fn test_lost_interface_forgets_samples() {
        let source = ScriptedCounters::new();
        source.push_interface("en0", counters(100, 100));

        let mut collector = NetworkCollector::new("en0", false);
        let start = Instant::now();
        collector.update(&source, start);
        source.remove_interface("en0");
        assert!(collector.update(&source, start + Duration::from_secs(1)).is_unavailable());

        source.push_interface("en0", counters(200, 200));
        let metric = collector.update(&source, start + Duration::from_secs(2));
        assert_eq!(metric, DerivedMetric::Network(Reading::WarmingUp));
    }
}
