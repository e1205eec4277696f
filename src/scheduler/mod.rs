//! Periodic polling of the collectors.
//!
//! Every cadence class runs on its own [`RepeatingTrigger`] and owns its
//! collectors outright, so a collector is never updated concurrently with
//! itself and a slow cadence never delays a fast one. All triggers fire once
//! immediately on start.

pub mod hub;
pub mod trigger;

pub use hub::MetricHub;
pub use trigger::RepeatingTrigger;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::metrics::{
    BatteryCollector, Collector, CounterSource, CpuCollector, DerivedMetric, DiskCollector,
    MemoryCollector, NetworkCollector,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::info;

/// A group of collectors polled on a shared period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// CPU, memory and network
    Fast,
    Battery,
    Disk,
}

impl Cadence {
    pub const ALL: [Cadence; 3] = [Cadence::Fast, Cadence::Battery, Cadence::Disk];

    pub fn name(self) -> &'static str {
        match self {
            Cadence::Fast => "fast",
            Cadence::Battery => "battery",
            Cadence::Disk => "disk",
        }
    }

    pub fn period(self, config: &EngineConfig) -> Duration {
        match self {
            Cadence::Fast => config.fast_period,
            Cadence::Battery => config.battery_period,
            Cadence::Disk => config.disk_period,
        }
    }

    /// Fresh collectors for this cadence.
    pub fn collectors(self, config: &EngineConfig) -> Vec<Box<dyn Collector>> {
        match self {
            Cadence::Fast => vec![
                Box::new(CpuCollector::new()),
                Box::new(MemoryCollector::new()),
                Box::new(NetworkCollector::new(
                    config.interface.clone(),
                    config.auto_detect_interface,
                )),
            ],
            Cadence::Battery => vec![Box::new(BatteryCollector::new())],
            Cadence::Disk => vec![Box::new(DiskCollector::new(config.disk_path.clone()))],
        }
    }
}

/// Update each collector once and return what they derived.
pub fn sample(
    collectors: &mut [Box<dyn Collector>],
    source: &dyn CounterSource,
    now: Instant,
) -> Vec<DerivedMetric> {
    collectors
        .iter_mut()
        .map(|collector| collector.update(source, now))
        .collect()
}

/// Drives every cadence and publishes into a [`MetricHub`].
pub struct PollScheduler {
    hub: Arc<MetricHub>,
    stop_tx: watch::Sender<bool>,
    triggers: Vec<RepeatingTrigger>,
}

impl PollScheduler {
    /// Validate `config` and spawn one trigger per cadence.
    ///
    /// Must be called from within a Tokio runtime. Register observers on
    /// `hub` beforehand to see the immediate first tick.
    pub fn start(
        config: &EngineConfig,
        source: Arc<dyn CounterSource>,
        hub: Arc<MetricHub>,
    ) -> Result<Self> {
        config.validate()?;

        let (stop_tx, _) = watch::channel(false);
        let triggers = Cadence::ALL
            .into_iter()
            .map(|cadence| {
                let mut collectors = cadence.collectors(config);
                let source = Arc::clone(&source);
                let hub = Arc::clone(&hub);

                RepeatingTrigger::spawn(
                    cadence.name(),
                    cadence.period(config),
                    stop_tx.subscribe(),
                    move || {
                        // Tokio's clock, so paused-time runs stay consistent.
                        let now = tokio::time::Instant::now().into_std();
                        for metric in sample(&mut collectors, source.as_ref(), now) {
                            hub.publish(metric);
                        }
                    },
                )
            })
            .collect();

        info!(
            "Poll scheduler started (fast {:?}, battery {:?}, disk {:?})",
            config.fast_period, config.battery_period, config.disk_period
        );

        Ok(Self {
            hub,
            stop_tx,
            triggers,
        })
    }

    pub fn hub(&self) -> &Arc<MetricHub> {
        &self.hub
    }

    /// Disable every trigger at once, then wait for all of them to finish.
    ///
    /// Collectors are dropped with their trigger tasks, after the last fire.
    pub async fn stop(self) {
        self.stop_tx.send_replace(true);
        for trigger in self.triggers {
            trigger.join().await;
        }
        info!("Poll scheduler stopped");
    }
}
