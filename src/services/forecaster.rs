//! Monthly earnings projection by ordinary least squares
//!
//! Fits `y = slope * x + intercept` over month indices `0..n` and extends the
//! line forward. Projections never go below zero.

use chrono::{Months, NaiveDate};
use serde::Serialize;

pub const DEFAULT_HISTORY_MONTHS: u32 = 6;
pub const DEFAULT_FUTURE_MONTHS: u32 = 3;

/// Total sales for one calendar month, `month` is the first day of it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyTotal {
    pub month: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedEarning {
    /// `YYYY-MM`
    pub month: String,
    pub actual: Option<f64>,
    pub projected: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Closed-form OLS over `(index, value)` pairs. `None` for an empty series.
pub fn linear_regression(values: &[f64]) -> Option<LinearFit> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let x_sum: f64 = (0..values.len()).map(|i| i as f64).sum();
    let y_sum: f64 = values.iter().sum();
    let xy_sum: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let x2_sum: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();

    let denominator = n * x2_sum - x_sum * x_sum;
    let slope = if denominator == 0.0 {
        0.0
    } else {
        (n * xy_sum - x_sum * y_sum) / denominator
    };
    let intercept = (y_sum - slope * x_sum) / n;

    Some(LinearFit { slope, intercept })
}

pub fn forecast_monthly(monthly_actuals: &[MonthlyTotal], future_months: u32) -> Vec<ProjectedEarning> {
    let values: Vec<f64> = monthly_actuals.iter().map(|m| m.total).collect();

    let (Some(fit), Some(last)) = (linear_regression(&values), monthly_actuals.last()) else {
        return Vec::new();
    };

    tracing::debug!(
        "Earnings trend over {} months: slope={:.2}, intercept={:.2}",
        values.len(),
        fit.slope,
        fit.intercept
    );

    let n = values.len();
    let mut series: Vec<ProjectedEarning> = monthly_actuals
        .iter()
        .map(|m| ProjectedEarning {
            month: month_label(m.month),
            actual: Some(m.total),
            projected: None,
        })
        .collect();

    for i in 1..=future_months {
        let Some(month) = last.month.checked_add_months(Months::new(i)) else {
            break;
        };
        let projected = fit.at((n + i as usize - 1) as f64).round().max(0.0);

        series.push(ProjectedEarning {
            month: month_label(month),
            actual: None,
            projected: Some(projected),
        });
    }

    series
}

pub fn month_label(month: NaiveDate) -> String {
    month.format("%Y-%m").to_string()
}
