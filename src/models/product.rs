//! Product request/response models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::products;
use crate::services::inventory::{NewProduct, ProductUpdate};
use crate::services::sales_data::decimal_to_f64;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub selling_price: Decimal,
    #[serde(default)]
    pub unit_cost: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        Self {
            name: req.name,
            sku: req.sku,
            category: req.category,
            selling_price: req.selling_price,
            unit_cost: req.unit_cost,
            stock_quantity: req.stock_quantity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub selling_price: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub stock_quantity: Option<i32>,
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            name: req.name,
            sku: req.sku,
            category: req.category,
            selling_price: req.selling_price,
            unit_cost: req.unit_cost,
            stock_quantity: req.stock_quantity,
        }
    }
}

/// Signed stock adjustment, e.g. `{"delta": 24}` for a delivery
#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustmentRequest {
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub selling_price: f64,
    pub unit_cost: f64,
    pub stock_quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<products::Model> for ProductResponse {
    fn from(p: products::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            sku: p.sku,
            category: p.category,
            selling_price: decimal_to_f64(p.selling_price),
            unit_cost: decimal_to_f64(p.unit_cost),
            stock_quantity: p.stock_quantity,
            updated_at: p.updated_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"name": "Tea", "sellingPrice": 3.5}"#).unwrap();
        assert_eq!(req.selling_price, dec!(3.5));
        assert_eq!(req.unit_cost, Decimal::ZERO);
        assert_eq!(req.stock_quantity, 0);
    }

    #[test]
    fn test_update_request_is_partial() {
        let req: UpdateProductRequest = serde_json::from_str(r#"{"stockQuantity": 4}"#).unwrap();
        let update = ProductUpdate::from(req);
        assert_eq!(update.stock_quantity, Some(4));
        assert!(update.selling_price.is_none());
    }
}
