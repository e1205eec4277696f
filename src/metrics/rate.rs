//! Rate computation over monotonic counters.

use std::time::Instant;

/// A counter value observed at a moment in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub value: u64,
    pub timestamp: Instant,
}

impl Sample {
    pub fn new(value: u64, timestamp: Instant) -> Self {
        Self { value, timestamp }
    }
}

/// Units per second between two samples of the same counter.
///
/// A decrease means the counter was reset; that tick reports zero instead of
/// a wrapped delta. Identical or out-of-order timestamps also report zero.
pub fn rate(previous: &Sample, current: &Sample) -> f64 {
    let delta = current.value.saturating_sub(previous.value);

    let elapsed = match current.timestamp.checked_duration_since(previous.timestamp) {
        Some(elapsed) if !elapsed.is_zero() => elapsed,
        _ => return 0.0,
    };

    delta as f64 / elapsed.as_secs_f64()
}

/// Tracks the previous sample of one counter.
#[derive(Debug, Clone, Default)]
pub struct RateCounter {
    previous: Option<Sample>,
}

impl RateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample and return the rate since the previous one.
    ///
    /// Returns `None` for the first sample.
    pub fn observe(&mut self, sample: Sample) -> Option<f64> {
        let rate = self.previous.as_ref().map(|previous| rate(previous, &sample));
        self.previous = Some(sample);
        rate
    }

    /// Forget the previous sample.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn has_sample(&self) -> bool {
        self.previous.is_some()
    }
}
