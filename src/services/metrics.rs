//! Summary statistics over a numeric series
//!
//! Percentiles use nearest rank on the sorted series (`floor(p * count)`,
//! clamped to the last index). No interpolation.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Percentiles {
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Count/sum/avg/min/max/median/percentiles. All zero for an empty series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsResult {
    pub count: usize,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub percentiles: Percentiles,
}

pub fn compute_metrics(values: &[f64]) -> MetricsResult {
    if values.is_empty() {
        return MetricsResult::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();

    MetricsResult {
        count,
        sum,
        avg: sum / count as f64,
        min: sorted[0],
        max: sorted[count - 1],
        median: median_of_sorted(&sorted),
        percentiles: Percentiles {
            p25: percentile_of_sorted(&sorted, 0.25),
            p75: percentile_of_sorted(&sorted, 0.75),
            p90: percentile_of_sorted(&sorted, 0.90),
            p95: percentile_of_sorted(&sorted, 0.95),
            p99: percentile_of_sorted(&sorted, 0.99),
        },
    }
}

/// Median of an already sorted slice, 0 when empty
pub fn median_of_sorted(sorted: &[f64]) -> f64 {
    let count = sorted.len();
    if count == 0 {
        return 0.0;
    }

    let mid = count / 2;
    if count % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Nearest-rank percentile of an already sorted slice, 0 when empty
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let index = ((p * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    sorted[index]
}
