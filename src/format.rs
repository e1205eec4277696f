//! Presentation formatting for derived metrics.
//!
//! Pure functions, no state. Byte quantities use binary units.

use crate::metrics::data::TimeLeft;

/// Placeholder for a resource that is absent or could not be read.
pub const UNAVAILABLE: &str = "N/D";

/// Placeholder shown until a collector has enough samples for a delta.
pub const WARMING_UP: &str = "Calculating...";

/// Placeholder for an interface without an IPv4 address.
pub const NO_ADDRESS: &str = "N/A";

const KIB: f64 = 1024.0;
const MIB: f64 = 1_048_576.0;

/// Format a throughput, e.g. `"2.00 KB/s"`.
pub fn format_rate(bytes_per_second: f64) -> String {
    if !bytes_per_second.is_finite() {
        return UNAVAILABLE.to_string();
    }

    if bytes_per_second >= MIB {
        format!("{:.2} MB/s", bytes_per_second / MIB)
    } else if bytes_per_second >= KIB {
        format!("{:.2} KB/s", bytes_per_second / KIB)
    } else {
        format!("{:.2} B/s", bytes_per_second)
    }
}

/// Format an absolute byte quantity, e.g. `"7.50 GB"`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= KIB && unit < UNITS.len() - 1 {
        value /= KIB;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}

/// Format a percentage with one decimal place.
pub fn format_percent(pct: f64) -> String {
    if pct.is_finite() {
        format!("{:.1}%", pct)
    } else {
        UNAVAILABLE.to_string()
    }
}

pub fn format_temperature(celsius: f32) -> String {
    if celsius.is_finite() {
        format!("{:.1}°C", celsius)
    } else {
        UNAVAILABLE.to_string()
    }
}

/// Format remaining battery time as `H:MM`.
pub fn format_time_left(time_left: TimeLeft) -> String {
    match time_left {
        TimeLeft::Minutes(minutes) => format!("{}:{:02}", minutes / 60, minutes % 60),
        TimeLeft::Indeterminate => UNAVAILABLE.to_string(),
    }
}
