//! Publication of derived metrics to observers.

use crate::metrics::data::{DerivedMetric, MetricKind};
use std::sync::RwLock;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

type Callback = Box<dyn Fn(&DerivedMetric) + Send + Sync>;

/// Holds the latest value of every metric kind and the callbacks observing it.
///
/// Each kind starts out warming up, so `current_value` is defined before the
/// first tick.
pub struct MetricHub {
    channels: [watch::Sender<DerivedMetric>; 5],
    observers: RwLock<[Vec<Callback>; 5]>,
}

impl Default for MetricHub {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricHub {
    pub fn new() -> Self {
        Self {
            channels: MetricKind::ALL.map(|kind| watch::channel(DerivedMetric::warming_up(kind)).0),
            observers: RwLock::new(Default::default()),
        }
    }

    /// Invoke `callback` with every value published for `kind`.
    ///
    /// Callbacks run on the scheduler task that produced the value and must
    /// not subscribe from inside the callback.
    pub fn subscribe<F>(&self, kind: MetricKind, callback: F)
    where
        F: Fn(&DerivedMetric) + Send + Sync + 'static,
    {
        match self.observers.write() {
            Ok(mut observers) => observers[kind as usize].push(Box::new(callback)),
            Err(poisoned) => poisoned.into_inner()[kind as usize].push(Box::new(callback)),
        }
    }

    /// The last value published for `kind`.
    pub fn current_value(&self, kind: MetricKind) -> DerivedMetric {
        self.channels[kind as usize].borrow().clone()
    }

    /// A receiver that is notified on every publish for `kind`.
    pub fn receiver(&self, kind: MetricKind) -> watch::Receiver<DerivedMetric> {
        self.channels[kind as usize].subscribe()
    }

    /// A stream starting with the current value of `kind`, then every update.
    pub fn watch(&self, kind: MetricKind) -> WatchStream<DerivedMetric> {
        WatchStream::new(self.receiver(kind))
    }

    /// Store `metric` as the current value of its kind and notify observers.
    pub fn publish(&self, metric: DerivedMetric) {
        let kind = metric.kind();
        self.channels[kind as usize].send_replace(metric.clone());

        let observers = match self.observers.read() {
            Ok(observers) => observers,
            Err(poisoned) => {
                warn!("An observer of {} panicked earlier", kind);
                poisoned.into_inner()
            }
        };
        for callback in &observers[kind as usize] {
            callback(&metric);
        }
    }
}
