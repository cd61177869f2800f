//! Aggregate navigation statistics

use serde::Serialize;

/// Summary of navigation durations in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationStats {
    pub count: usize,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl NavigationStats {
    /// Compute stats over a duration sequence, `None` when empty
    pub fn from_durations(durations: &[f64]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }

        let mut sorted = durations.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean_ms = sorted.iter().sum::<f64>() / count as f64;

        Some(Self {
            count,
            median_ms: median(&sorted),
            p95_ms: percentile(&sorted, 95.0),
            mean_ms,
            min_ms: sorted[0],
            max_ms: sorted[count - 1],
        })
    }
}

/// Median of a sorted, non-empty slice
fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Nearest-rank percentile of a sorted, non-empty slice
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    let rank = ((p / 100.0) * n as f64).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}
