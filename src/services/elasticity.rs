//! Price elasticity of demand from historical price changes
//!
//! Each price change contributes one sample, `%Δquantity / %Δprice`, where
//! quantity is average daily units sold in the window before and after the
//! change. Samples are combined with the median so a single promotion or
//! stock-out cannot swing the estimate.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::services::metrics::median_of_sorted;

/// Used when there is not enough history to estimate anything
pub const DEFAULT_ELASTICITY: f64 = -1.2;

/// Minimum number of price changes in the window before estimating
pub const MIN_PRICE_CHANGES: usize = 5;

pub const MEDIUM_CONFIDENCE_SAMPLES: usize = 5;
pub const HIGH_CONFIDENCE_SAMPLES: usize = 10;

/// Days of sales on each side of a price change
pub const SALES_WINDOW_DAYS: i64 = 30;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_sample_size(samples: usize) -> Self {
        if samples >= HIGH_CONFIDENCE_SAMPLES {
            Confidence::High
        } else if samples >= MEDIUM_CONFIDENCE_SAMPLES {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

/// One change of a product's selling price with the demand around it
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChangeEvent {
    /// Price in force before the change. `None` for the first recorded price.
    pub previous_price: Option<f64>,
    pub new_price: f64,
    pub effective_at: DateTime<Utc>,
    pub avg_daily_sales_before: f64,
    pub avg_daily_sales_after: f64,
}

/// Window of history considered, ending at `as_of`
#[derive(Debug, Clone, Copy)]
pub struct LookbackWindow {
    pub as_of: DateTime<Utc>,
    pub days: i64,
}

impl LookbackWindow {
    pub fn new(as_of: DateTime<Utc>, days: i64) -> Self {
        Self { as_of, days }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.as_of - Duration::days(self.days)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at <= self.as_of
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticityEstimate {
    pub elasticity: f64,
    pub confidence: Confidence,
    pub sample_size: usize,
}

impl ElasticityEstimate {
    fn fallback() -> Self {
        Self {
            elasticity: DEFAULT_ELASTICITY,
            confidence: Confidence::Low,
            sample_size: 0,
        }
    }

    /// Demand must fall as price rises for the estimate to be usable
    pub fn is_valid(&self) -> bool {
        self.elasticity < 0.0
    }
}

/// Single elasticity sample, `None` when a denominator would be zero
pub fn elasticity_sample(event: &PriceChangeEvent) -> Option<f64> {
    let old_price = event.previous_price.filter(|p| *p > 0.0)?;

    if event.avg_daily_sales_before <= 0.0 {
        return None;
    }

    let price_change = (event.new_price - old_price) / old_price;
    if price_change == 0.0 {
        return None;
    }

    let quantity_change =
        (event.avg_daily_sales_after - event.avg_daily_sales_before) / event.avg_daily_sales_before;

    Some(quantity_change / price_change)
}

pub fn estimate_elasticity(events: &[PriceChangeEvent], lookback: LookbackWindow) -> ElasticityEstimate {
    let in_window: Vec<&PriceChangeEvent> = events
        .iter()
        .filter(|e| lookback.contains(e.effective_at))
        .filter(|e| e.previous_price.is_some())
        .collect();

    if in_window.len() < MIN_PRICE_CHANGES {
        tracing::debug!(
            "Only {} price changes in the last {} days, using default elasticity",
            in_window.len(),
            lookback.days
        );
        return ElasticityEstimate::fallback();
    }

    let mut samples: Vec<f64> = in_window
        .into_iter()
        .filter_map(elasticity_sample)
        .filter(|s| s.is_finite())
        .collect();

    if samples.is_empty() {
        tracing::debug!("No usable elasticity samples, using default elasticity");
        return ElasticityEstimate::fallback();
    }

    samples.sort_by(|a, b| a.total_cmp(b));

    ElasticityEstimate {
        elasticity: median_of_sorted(&samples),
        confidence: Confidence::from_sample_size(samples.len()),
        sample_size: samples.len(),
    }
}
