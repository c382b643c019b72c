//! Dashboard reports: top sellers, low stock, margins, peak selling hours

use chrono::Timelike;
use serde::Serialize;
use std::collections::HashMap;

use crate::services::sales_data::{ProductSalesSummary, ProductSnapshot, SalesRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSeller {
    pub product_id: i32,
    pub name: String,
    pub quantity_sold: i64,
    pub order_count: usize,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockItem {
    pub product_id: i32,
    pub name: String,
    pub stock_quantity: i32,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMargin {
    pub product_id: i32,
    pub name: String,
    pub selling_price: f64,
    pub unit_cost: f64,
    pub unit_margin: f64,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourBucket {
    pub hour: u32,
    pub sale_lines: usize,
    pub units: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakHours {
    pub hours: Vec<HourBucket>,
    /// Hour with the most revenue, earliest on ties
    pub peak_hour: Option<u32>,
}

pub fn top_sellers(
    products: &[ProductSnapshot],
    summaries: &[ProductSalesSummary],
    limit: usize,
) -> Vec<TopSeller> {
    let names: HashMap<i32, &str> = products.iter().map(|p| (p.id, p.name.as_str())).collect();

    let mut sellers: Vec<TopSeller> = summaries
        .iter()
        .filter(|s| s.quantity > 0)
        .map(|s| TopSeller {
            product_id: s.product_id,
            name: names
                .get(&s.product_id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("Product #{}", s.product_id)),
            quantity_sold: s.quantity,
            order_count: s.order_count,
            revenue: s.revenue,
        })
        .collect();

    sellers.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then(b.revenue.total_cmp(&a.revenue))
            .then(a.product_id.cmp(&b.product_id))
    });
    sellers.truncate(limit);
    sellers
}

pub fn low_stock(products: &[ProductSnapshot], threshold: i32) -> Vec<LowStockItem> {
    let mut items: Vec<LowStockItem> = products
        .iter()
        .filter(|p| p.stock_quantity <= threshold)
        .map(|p| LowStockItem {
            product_id: p.id,
            name: p.name.clone(),
            stock_quantity: p.stock_quantity,
            category: p.category.clone(),
        })
        .collect();

    items.sort_by(|a, b| a.stock_quantity.cmp(&b.stock_quantity).then(a.product_id.cmp(&b.product_id)));
    items
}

pub fn margins(products: &[ProductSnapshot]) -> Vec<ProductMargin> {
    let mut rows: Vec<ProductMargin> = products
        .iter()
        .map(|p| {
            let unit_margin = p.selling_price - p.unit_cost;
            let margin_pct = if p.selling_price > 0.0 {
                unit_margin / p.selling_price * 100.0
            } else {
                0.0
            };

            ProductMargin {
                product_id: p.id,
                name: p.name.clone(),
                selling_price: p.selling_price,
                unit_cost: p.unit_cost,
                unit_margin,
                margin_pct,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.margin_pct.total_cmp(&a.margin_pct));
    rows
}

/// Sales bucketed by hour of day (UTC)
pub fn peak_hours(records: &[SalesRecord]) -> PeakHours {
    let mut hours: Vec<HourBucket> = (0..24)
        .map(|hour| HourBucket {
            hour,
            ..Default::default()
        })
        .collect();

    for record in records {
        let bucket = &mut hours[record.date.hour() as usize];
        bucket.sale_lines += 1;
        bucket.units += i64::from(record.quantity);
        bucket.revenue += record.total_amount;
    }

    let peak_hour = hours
        .iter()
        .filter(|b| b.sale_lines > 0)
        .fold(None::<&HourBucket>, |best, b| match best {
            Some(current) if current.revenue >= b.revenue => Some(current),
            _ => Some(b),
        })
        .map(|b| b.hour);

    PeakHours { hours, peak_hour }
}
