//! Analytics query parameters and response envelopes

use serde::{Deserialize, Serialize};

use crate::models::sale::DateRangeQuery;
use crate::services::forecaster::{ProjectedEarning, DEFAULT_FUTURE_MONTHS};
use crate::services::metrics::MetricsResult;
use crate::services::price_suggestions::PriceElasticityResult;
use crate::services::product_scorer::OptimalProduct;
use crate::services::reports::{LowStockItem, ProductMargin, TopSeller};
use crate::services::sales_data::DateRange;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 365;
pub const MAX_HISTORY_MONTHS: u32 = 36;
pub const MAX_FUTURE_MONTHS: u32 = 24;

fn check_range<T: PartialOrd + std::fmt::Display>(name: &str, value: T, min: T, max: T) -> Result<T, String> {
    if value < min || value > max {
        Err(format!("{} must be between {} and {}", name, min, max))
    } else {
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopSellersQuery {
    pub limit: Option<usize>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TopSellersQuery {
    pub fn validate(&self) -> Result<(usize, DateRange), String> {
        let limit = check_range("limit", self.limit.unwrap_or(DEFAULT_LIMIT), 1, MAX_LIMIT)?;
        let range = DateRangeQuery {
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
        }
        .validate()?;
        Ok((limit, range))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

impl LowStockQuery {
    pub fn validate(&self, default_threshold: i32) -> Result<i32, String> {
        match self.threshold {
            Some(t) if t < 0 => Err("threshold must not be negative".to_string()),
            Some(t) => Ok(t),
            None => Ok(default_threshold),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceSuggestionsQuery {
    pub lookback_days: Option<i64>,
}

impl PriceSuggestionsQuery {
    pub fn validate(&self, default_days: i64) -> Result<i64, String> {
        check_range("lookback_days", self.lookback_days.unwrap_or(default_days), 1, MAX_WINDOW_DAYS)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimalProductsQuery {
    pub days: Option<i64>,
    pub limit: Option<usize>,
}

impl OptimalProductsQuery {
    pub fn validate(&self) -> Result<(i64, usize), String> {
        let days = check_range("days", self.days.unwrap_or(DEFAULT_WINDOW_DAYS), 1, MAX_WINDOW_DAYS)?;
        let limit = check_range("limit", self.limit.unwrap_or(DEFAULT_LIMIT), 1, MAX_LIMIT)?;
        Ok((days, limit))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectedEarningsQuery {
    pub months: Option<u32>,
    pub future_months: Option<u32>,
}

impl ProjectedEarningsQuery {
    pub fn validate(&self, default_months: u32) -> Result<(u32, u32), String> {
        let months = check_range("months", self.months.unwrap_or(default_months), 1, MAX_HISTORY_MONTHS)?;
        let future = check_range(
            "future_months",
            self.future_months.unwrap_or(DEFAULT_FUTURE_MONTHS),
            1,
            MAX_FUTURE_MONTHS,
        )?;
        Ok((months, future))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeakHoursQuery {
    pub days: Option<i64>,
}

impl PeakHoursQuery {
    pub fn validate(&self) -> Result<i64, String> {
        check_range("days", self.days.unwrap_or(DEFAULT_WINDOW_DAYS), 1, MAX_WINDOW_DAYS)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesMetricsResponse {
    /// Metrics over per-sale totals
    pub sales: MetricsResult,
    /// Metrics over per-line quantities
    pub quantities: MetricsResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSellersResponse {
    pub top_sellers: Vec<TopSeller>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LowStockResponse {
    pub threshold: i32,
    pub products: Vec<LowStockItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarginsResponse {
    pub products: Vec<ProductMargin>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSuggestionsResponse {
    pub lookback_days: i64,
    pub suggestions: Vec<PriceElasticityResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimalProductsResponse {
    pub days: i64,
    pub products: Vec<OptimalProduct>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectedEarningsResponse {
    pub earnings: Vec<ProjectedEarning>,
}
