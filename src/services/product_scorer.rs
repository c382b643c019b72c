//! Composite "optimal product" score
//!
//! Five sub-scores on a 0-100 scale (margin, volume, returns, turnover,
//! recency) combined with fixed weights. Volume is relative to the best
//! seller in the batch, so scoring is two-pass.

use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::services::sales_data::{
    fetch_products, fetch_sales_records, summarize_by_product, DateRange, ProductSnapshot, SalesRecord,
};

pub const MARGIN_WEIGHT: f64 = 0.25;
pub const VOLUME_WEIGHT: f64 = 0.20;
pub const RETURN_WEIGHT: f64 = 0.15;
pub const TURNOVER_WEIGHT: f64 = 0.20;
pub const RECENCY_WEIGHT: f64 = 0.20;

/// Sales and catalogue figures for one product over the scoring window
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPerformance {
    pub product_id: i32,
    pub name: String,
    pub selling_price: f64,
    pub unit_cost: f64,
    pub stock_quantity: i32,
    /// Units sold in the window
    pub sales_volume: f64,
    /// Units returned out of `sales_volume`
    pub returned_quantity: f64,
    /// Units sold in the window of equal length before this one
    pub previous_sales_volume: f64,
    pub last_sale_at: Option<DateTime<Utc>>,
}

/// Window the performance figures were collected over
#[derive(Debug, Clone, Copy)]
pub struct SalesWindow {
    pub as_of: DateTime<Utc>,
    pub days: i64,
}

impl SalesWindow {
    pub fn start(&self) -> DateTime<Utc> {
        self.as_of - Duration::days(self.days)
    }

    /// The window of equal length ending where this one starts
    pub fn previous(&self) -> SalesWindow {
        SalesWindow {
            as_of: self.start(),
            days: self.days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalProductMetrics {
    pub sales_volume: f64,
    /// Percent of selling price
    pub profit_margin: f64,
    /// Percent of units sold
    pub return_rate: f64,
    /// Units sold per unit in stock
    pub restock_rate: f64,
    /// Percent change against the previous window
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalProduct {
    pub id: i32,
    pub name: String,
    pub score: u8,
    pub reason: String,
    pub metrics: OptimalProductMetrics,
}

struct RawScores {
    margin: f64,
    volume: f64,
    returns: f64,
    turnover: f64,
    recency: f64,
}

pub fn score_products(products: &[ProductPerformance], window: &SalesWindow) -> Vec<OptimalProduct> {
    let selling: Vec<&ProductPerformance> = products.iter().filter(|p| p.sales_volume > 0.0).collect();

    if selling.is_empty() {
        return Vec::new();
    }

    // First pass: raw sub-scores and the batch's best volume
    let scored: Vec<(&ProductPerformance, OptimalProductMetrics, RawScores)> = selling
        .into_iter()
        .map(|p| {
            let metrics = product_metrics(p);
            let raw = raw_scores(p, &metrics, window);
            (p, metrics, raw)
        })
        .collect();

    let max_volume = scored
        .iter()
        .map(|(_, _, raw)| raw.volume)
        .fold(0.0_f64, f64::max);

    // Second pass: normalize volume and combine
    let mut results: Vec<OptimalProduct> = scored
        .into_iter()
        .map(|(p, metrics, raw)| {
            let normalized_volume = if max_volume > 0.0 {
                raw.volume / max_volume * 100.0
            } else {
                0.0
            };

            let score = weighted_score(&RawScores {
                volume: normalized_volume,
                ..raw
            });

            OptimalProduct {
                id: p.product_id,
                name: p.name.clone(),
                score,
                reason: reason_for_score(score).to_string(),
                metrics,
            }
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));

    tracing::debug!("Scored {} of {} products", results.len(), products.len());

    results
}

fn product_metrics(p: &ProductPerformance) -> OptimalProductMetrics {
    let profit_margin = if p.selling_price > 0.0 {
        (p.selling_price - p.unit_cost) / p.selling_price * 100.0
    } else {
        0.0
    };

    let return_rate = if p.sales_volume > 0.0 {
        p.returned_quantity / p.sales_volume * 100.0
    } else {
        0.0
    };

    // Out-of-stock products count as one unit on hand
    let restock_rate = p.sales_volume / f64::from(p.stock_quantity.max(1));

    let growth_rate = if p.previous_sales_volume > 0.0 {
        (p.sales_volume - p.previous_sales_volume) / p.previous_sales_volume * 100.0
    } else {
        0.0
    };

    OptimalProductMetrics {
        sales_volume: p.sales_volume,
        profit_margin,
        return_rate,
        restock_rate,
        growth_rate,
    }
}

fn raw_scores(p: &ProductPerformance, metrics: &OptimalProductMetrics, window: &SalesWindow) -> RawScores {
    let days_since_last_sale = p
        .last_sale_at
        .map(|at| (window.as_of - at).num_days().max(0) as f64)
        .unwrap_or(window.days as f64);

    RawScores {
        margin: (metrics.profit_margin * 2.0).clamp(0.0, 100.0),
        volume: metrics.sales_volume,
        returns: (100.0 - metrics.return_rate * 10.0).max(0.0),
        turnover: (metrics.restock_rate * 20.0).min(100.0),
        recency: (100.0 - days_since_last_sale * 2.0).max(0.0),
    }
}

fn weighted_score(s: &RawScores) -> u8 {
    let score = s.margin * MARGIN_WEIGHT
        + s.volume * VOLUME_WEIGHT
        + s.returns * RETURN_WEIGHT
        + s.turnover * TURNOVER_WEIGHT
        + s.recency * RECENCY_WEIGHT;

    score.round().clamp(0.0, 100.0) as u8
}

/// Join catalogue rows with sale lines covering both the window and the one before it
pub fn build_performance(
    products: &[ProductSnapshot],
    records: &[SalesRecord],
    window: &SalesWindow,
) -> Vec<ProductPerformance> {
    let start = window.start();
    let previous_start = window.previous().start();

    let (current, previous): (Vec<SalesRecord>, Vec<SalesRecord>) = records
        .iter()
        .filter(|r| r.date >= previous_start && r.date < window.as_of)
        .cloned()
        .partition(|r| r.date >= start);

    let current = summarize_by_product(&current);
    let previous = summarize_by_product(&previous);

    products
        .iter()
        .map(|p| {
            let now = current.get(&p.id);
            ProductPerformance {
                product_id: p.id,
                name: p.name.clone(),
                selling_price: p.selling_price,
                unit_cost: p.unit_cost,
                stock_quantity: p.stock_quantity,
                sales_volume: now.map(|s| s.quantity as f64).unwrap_or(0.0),
                returned_quantity: now.map(|s| s.returned_quantity as f64).unwrap_or(0.0),
                previous_sales_volume: previous.get(&p.id).map(|s| s.quantity as f64).unwrap_or(0.0),
                last_sale_at: now.and_then(|s| s.last_sale_at),
            }
        })
        .collect()
}

pub async fn fetch_optimal_products(
    db: &DatabaseConnection,
    window: SalesWindow,
    limit: usize,
) -> Result<Vec<OptimalProduct>, Box<dyn std::error::Error + Send + Sync>> {
    let products = fetch_products(db).await?;
    let range = DateRange::new(Some(window.previous().start()), Some(window.as_of));
    let records = fetch_sales_records(db, range).await?;

    let performance = build_performance(&products, &records, &window);
    let mut scored = score_products(&performance, &window);
    scored.truncate(limit);

    tracing::info!("Ranked {} optimal products over {} days", scored.len(), window.days);
    Ok(scored)
}

pub fn reason_for_score(score: u8) -> &'static str {
    if score > 75 {
        "High performer with strong margins and sales velocity"
    } else if score > 50 {
        "Good balanced performance"
    } else {
        "Average performer"
    }
}
