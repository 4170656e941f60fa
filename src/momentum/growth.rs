//! Windowed growth rate of a daily series.
//!
//! Growth compares the sum of the most recent `window_days` records against
//! the sum of the `window_days` records right before them. Both windows use
//! sums, so the ratio is the same as it would be with means.

use super::models::{EngagementRecord, StreamingRecord};

/// A per-day value that can be aggregated into a growth window.
pub trait DailyMetric {
    fn metric_value(&self) -> f64;
}

impl DailyMetric for StreamingRecord {
    fn metric_value(&self) -> f64 {
        self.streams as f64
    }
}

impl DailyMetric for EngagementRecord {
    fn metric_value(&self) -> f64 {
        self.interactions() as f64
    }
}

impl DailyMetric for u64 {
    fn metric_value(&self) -> f64 {
        *self as f64
    }
}

/// Relative change between the trailing window and the one preceding it.
///
/// Returns 0 when fewer than `2 * window_days` records are available.
/// The result is unbounded in both directions.
pub fn compute_growth<T: DailyMetric>(series: &[T], window_days: usize) -> f64 {
    let needed = match window_days.checked_mul(2) {
        Some(needed) if window_days > 0 => needed,
        _ => return 0.0,
    };
    if series.len() < needed {
        return 0.0;
    }

    let len = series.len();
    let recent: f64 = series[len - window_days..]
        .iter()
        .map(DailyMetric::metric_value)
        .sum();
    let previous: f64 = series[len - needed..len - window_days]
        .iter()
        .map(DailyMetric::metric_value)
        .sum();

    if previous > 0.0 {
        (recent - previous) / previous
    } else if recent > 0.0 {
        1.0
    } else {
        0.0
    }
}
