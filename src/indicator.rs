//! Pacing for the animated status indicator.
//!
//! The indicator advances one frame per interval; busier CPUs shorten the
//! interval so the animation speeds up with load.

use std::time::Duration;

const BASE_INTERVAL: Duration = Duration::from_millis(200);
const MAX_ADJUSTMENT: Duration = Duration::from_millis(150);
const MIN_INTERVAL: Duration = Duration::from_millis(50);

/// Frame interval for the given CPU busy percentage.
pub fn frame_interval(busy_pct: f64) -> Duration {
    let load = if busy_pct.is_finite() {
        (busy_pct / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let adjustment =
        Duration::from_micros((MAX_ADJUSTMENT.as_micros() as f64 * load).round() as u64);

    BASE_INTERVAL.saturating_sub(adjustment).max(MIN_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_cpu_uses_base_interval() {
        assert_eq!(frame_interval(0.0), BASE_INTERVAL);
    }

    #[test]
    fn test_saturated_cpu_uses_fastest_interval() {
        assert_eq!(frame_interval(100.0), Duration::from_millis(50));
        assert_eq!(frame_interval(250.0), Duration::from_millis(50));
    }

    #[test]
    fn test_interval_shrinks_with_load() {
        let half = frame_interval(50.0);
        assert_eq!(half, Duration::from_millis(125));
        assert!(frame_interval(80.0) < half);
    }

    #[test]
    fn test_garbage_input_is_treated_as_idle() {
        assert_eq!(frame_interval(f64::NAN), BASE_INTERVAL);
        assert_eq!(frame_interval(-10.0), BASE_INTERVAL);
    }
}
