//! Sale entry, listing and import models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{sale_items, sales};
use crate::services::inventory::{ImportRow, ImportRowOutcome, NewSale, NewSaleItem};
use crate::services::sales_data::{decimal_to_f64, DateRange};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    /// Defaults to now
    pub sold_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub items: Vec<SaleItemRequest>,
}

impl From<CreateSaleRequest> for NewSale {
    fn from(req: CreateSaleRequest) -> Self {
        Self {
            sold_at: req.sold_at.unwrap_or_else(Utc::now),
            note: req.note,
            items: req
                .items
                .into_iter()
                .map(|i| NewSaleItem {
                    product_id: i.product_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemResponse {
    pub id: i32,
    pub sale_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub returned_quantity: i32,
    pub sold_at: DateTime<Utc>,
}

impl From<sale_items::Model> for SaleItemResponse {
    fn from(item: sale_items::Model) -> Self {
        Self {
            id: item.id,
            sale_id: item.sale_id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: decimal_to_f64(item.unit_price),
            total_amount: decimal_to_f64(item.total_amount),
            returned_quantity: item.returned_quantity,
            sold_at: item.sold_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub id: i32,
    pub sold_at: DateTime<Utc>,
    pub total_amount: f64,
    pub note: Option<String>,
    pub items: Vec<SaleItemResponse>,
}

impl SaleResponse {
    pub fn new(sale: sales::Model, items: Vec<sale_items::Model>) -> Self {
        Self {
            id: sale.id,
            sold_at: sale.sold_at.with_timezone(&Utc),
            total_amount: decimal_to_f64(sale.total_amount),
            note: sale.note,
            items: items.into_iter().map(SaleItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleLinesResponse {
    pub lines: Vec<SaleItemResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnRequest {
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnResponse {
    pub line: SaleItemResponse,
    pub stock_quantity: i32,
}

/// Optional `YYYY-MM-DD` bounds, end date inclusive
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    pub fn validate(&self) -> Result<DateRange, String> {
        let start = parse_date("start_date", self.start_date.as_deref())?;
        let end = parse_date("end_date", self.end_date.as_deref())?;

        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err("start_date must not be after end_date".to_string());
            }
        }

        Ok(DateRange::new(
            start.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|d| d.and_utc()),
            end.and_then(|d| d.succ_opt())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc()),
        ))
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .map_err(|_| format!("Invalid {} format: '{}'. Expected YYYY-MM-DD", field, v))
        })
        .transpose()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSaleRow {
    pub product_id: Option<i32>,
    pub sku: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub sold_at: Option<DateTime<Utc>>,
}

impl From<ImportSaleRow> for ImportRow {
    fn from(row: ImportSaleRow) -> Self {
        Self {
            product_id: row.product_id,
            sku: row.sku,
            quantity: row.quantity,
            unit_price: row.unit_price,
            sold_at: row.sold_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportSalesRequest {
    pub rows: Vec<ImportSaleRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowResponse {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ImportRowOutcome> for ImportRowResponse {
    fn from(o: ImportRowOutcome) -> Self {
        Self {
            row: o.row,
            sale_id: o.sale_id,
            error: o.error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSalesResponse {
    pub imported: usize,
    pub failed: usize,
    pub rows: Vec<ImportRowResponse>,
}
