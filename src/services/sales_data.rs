//! Data layer for analytics
//!
//! Loads products, sale lines and price history from the database and
//! converts them into plain `f64` records. Aggregation happens in memory so
//! the same code serves every report.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::entities::{
    price_history, products, sale_items,
    prelude::{PriceHistory, Products, SaleItems},
};
use crate::services::elasticity::{PriceChangeEvent, SALES_WINDOW_DAYS};
use crate::services::forecaster::MonthlyTotal;

/// One sold line item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRecord {
    pub sale_id: i32,
    pub date: DateTime<Utc>,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub returned_quantity: i32,
}

impl From<sale_items::Model> for SalesRecord {
    fn from(item: sale_items::Model) -> Self {
        Self {
            sale_id: item.sale_id,
            date: item.sold_at.with_timezone(&Utc),
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: decimal_to_f64(item.unit_price),
            total_amount: decimal_to_f64(item.total_amount),
            returned_quantity: item.returned_quantity,
        }
    }
}

/// Product attributes at the time of a computation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: i32,
    pub name: String,
    pub selling_price: f64,
    pub unit_cost: f64,
    pub stock_quantity: i32,
    pub category: Option<String>,
}

impl From<products::Model> for ProductSnapshot {
    fn from(p: products::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            selling_price: decimal_to_f64(p.selling_price),
            unit_cost: decimal_to_f64(p.unit_cost),
            stock_quantity: p.stock_quantity,
            category: p.category,
        }
    }
}

/// A selling price and when it took effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub product_id: i32,
    pub price: f64,
    pub effective_at: DateTime<Utc>,
}

impl From<price_history::Model> for PricePoint {
    fn from(p: price_history::Model) -> Self {
        Self {
            product_id: p.product_id,
            price: decimal_to_f64(p.price),
            effective_at: p.effective_at.with_timezone(&Utc),
        }
    }
}

/// Per-product totals over a date range
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductSalesSummary {
    pub product_id: i32,
    pub quantity: i64,
    pub order_count: usize,
    pub revenue: f64,
    pub returned_quantity: i64,
    pub last_sale_at: Option<DateTime<Utc>>,
}

/// Optional inclusive start / exclusive end
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// The `days` days up to `as_of`
    pub fn trailing_days(as_of: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: Some(as_of - Duration::days(days)),
            end: Some(as_of),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| at >= s) && self.end.is_none_or(|e| at < e)
    }
}

pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

pub async fn fetch_products(
    db: &DatabaseConnection,
) -> Result<Vec<ProductSnapshot>, Box<dyn std::error::Error + Send + Sync>> {
    let rows = Products::find()
        .order_by(products::Column::Id, Order::Asc)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(ProductSnapshot::from).collect())
}

pub async fn fetch_sales_records(
    db: &DatabaseConnection,
    range: DateRange,
) -> Result<Vec<SalesRecord>, Box<dyn std::error::Error + Send + Sync>> {
    let mut query = SaleItems::find();

    if let Some(start) = range.start {
        query = query.filter(sale_items::Column::SoldAt.gte(start));
    }
    if let Some(end) = range.end {
        query = query.filter(sale_items::Column::SoldAt.lt(end));
    }

    let rows = query
        .order_by(sale_items::Column::SoldAt, Order::Asc)
        .all(db)
        .await?;

    tracing::debug!("Loaded {} sale lines for {:?}", rows.len(), range);

    Ok(rows.into_iter().map(SalesRecord::from).collect())
}

/// Full price history, ordered by product then time
pub async fn fetch_price_history(
    db: &DatabaseConnection,
) -> Result<Vec<PricePoint>, Box<dyn std::error::Error + Send + Sync>> {
    let rows = PriceHistory::find()
        .order_by(price_history::Column::ProductId, Order::Asc)
        .order_by(price_history::Column::EffectiveAt, Order::Asc)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(PricePoint::from).collect())
}

pub async fn fetch_product_sales_summary(
    db: &DatabaseConnection,
    range: DateRange,
) -> Result<Vec<ProductSalesSummary>, Box<dyn std::error::Error + Send + Sync>> {
    let records = fetch_sales_records(db, range).await?;
    let mut summaries: Vec<ProductSalesSummary> = summarize_by_product(&records).into_values().collect();
    summaries.sort_by_key(|s| s.product_id);
    Ok(summaries)
}

/// Sale totals for the `months` complete calendar months before `as_of`'s month
pub async fn fetch_monthly_totals(
    db: &DatabaseConnection,
    as_of: DateTime<Utc>,
    months: u32,
) -> Result<Vec<MonthlyTotal>, Box<dyn std::error::Error + Send + Sync>> {
    let current_month = month_start(as_of.date_naive());
    let Some(first_month) = current_month.checked_sub_months(Months::new(months)) else {
        return Ok(Vec::new());
    };

    let range = DateRange::new(
        Some(first_month.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()),
        Some(current_month.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()),
    );
    let records = fetch_sales_records(db, range).await?;

    Ok(bucket_monthly(&records, first_month, months))
}

pub fn summarize_by_product(records: &[SalesRecord]) -> HashMap<i32, ProductSalesSummary> {
    let mut summaries: HashMap<i32, ProductSalesSummary> = HashMap::new();
    let mut orders: HashMap<i32, HashSet<i32>> = HashMap::new();

    for record in records {
        let summary = summaries
            .entry(record.product_id)
            .or_insert_with(|| ProductSalesSummary {
                product_id: record.product_id,
                ..Default::default()
            });

        summary.quantity += i64::from(record.quantity);
        summary.revenue += record.total_amount;
        summary.returned_quantity += i64::from(record.returned_quantity);
        summary.last_sale_at = summary.last_sale_at.max(Some(record.date));

        orders.entry(record.product_id).or_default().insert(record.sale_id);
    }

    for (product_id, sale_ids) in orders {
        if let Some(summary) = summaries.get_mut(&product_id) {
            summary.order_count = sale_ids.len();
        }
    }

    summaries
}

/// Sum of line totals per sale
pub fn sale_totals(records: &[SalesRecord]) -> Vec<f64> {
    let mut totals: HashMap<i32, f64> = HashMap::new();
    for record in records {
        *totals.entry(record.sale_id).or_default() += record.total_amount;
    }

    let mut totals: Vec<(i32, f64)> = totals.into_iter().collect();
    totals.sort_by_key(|(id, _)| *id);
    totals.into_iter().map(|(_, total)| total).collect()
}

/// Totals per calendar month starting at `first_month`, zero-filled
pub fn bucket_monthly(records: &[SalesRecord], first_month: NaiveDate, months: u32) -> Vec<MonthlyTotal> {
    let mut buckets: Vec<MonthlyTotal> = (0..months)
        .filter_map(|i| first_month.checked_add_months(Months::new(i)))
        .map(|month| MonthlyTotal { month, total: 0.0 })
        .collect();

    for record in records {
        let month = month_start(record.date.date_naive());
        if let Some(bucket) = buckets.iter_mut().find(|b| b.month == month) {
            bucket.total += record.total_amount;
        }
    }

    buckets
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Units sold per day between `from` and `to`
pub fn average_daily_units(records: &[SalesRecord], from: DateTime<Utc>, to: DateTime<Utc>, days: f64) -> f64 {
    if days <= 0.0 {
        return 0.0;
    }

    let units: i64 = records
        .iter()
        .filter(|r| r.date >= from && r.date < to)
        .map(|r| i64::from(r.quantity))
        .sum();

    units as f64 / days
}

/// Turn one product's ordered price history into change events with the
/// average daily sales on either side of each change.
///
/// The after-window is cut at `as_of` for recent changes and averaged over
/// the days actually elapsed (at least one).
pub fn build_price_change_events(
    history: &[PricePoint],
    sales: &[SalesRecord],
    as_of: DateTime<Utc>,
) -> Vec<PriceChangeEvent> {
    let window = Duration::days(SALES_WINDOW_DAYS);

    history
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let t = point.effective_at;
            let after_end = (t + window).min(as_of);
            let after_days = (after_end - t).num_days().clamp(1, SALES_WINDOW_DAYS) as f64;

            PriceChangeEvent {
                previous_price: i.checked_sub(1).map(|prev| history[prev].price),
                new_price: point.price,
                effective_at: t,
                avg_daily_sales_before: average_daily_units(sales, t - window, t, SALES_WINDOW_DAYS as f64),
                avg_daily_sales_after: average_daily_units(sales, t, after_end, after_days),
            }
        })
        .collect()
}
