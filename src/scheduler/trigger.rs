//! A cancelable repeating trigger.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error};

/// Runs a callback on a fixed period until the shared stop signal flips.
///
/// The first fire happens immediately.
pub struct RepeatingTrigger {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl RepeatingTrigger {
    /// Spawn the trigger on the current Tokio runtime.
    pub fn spawn<F>(
        name: &'static str,
        period: Duration,
        mut stop: watch::Receiver<bool>,
        mut on_fire: F,
    ) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    changed = stop.changed() => {
                        // A dropped sender also means stop.
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if *stop.borrow() {
                            break;
                        }
                        on_fire();
                    }
                }
            }

            debug!("Trigger {} stopped", name);
        });

        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wait for the trigger task to finish after the stop signal was sent.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            error!("Trigger {} ended abnormally: {}", self.name, err);
        }
    }
}
