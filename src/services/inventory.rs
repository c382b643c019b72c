//! Product catalogue and sales writes
//!
//! Every write that changes stock or price runs in one transaction. Price
//! changes append to `price_history`, which feeds the elasticity estimator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;

use crate::entities::{
    price_history, products, sale_items, sales,
    prelude::{Products, SaleItems},
};

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub selling_price: Decimal,
    pub unit_cost: Decimal,
    pub stock_quantity: i32,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.name.trim().is_empty() {
            return Err(InventoryError::Invalid("Product name must not be empty".to_string()));
        }
        validate_amounts(Some(self.selling_price), Some(self.unit_cost), Some(self.stock_quantity))
    }
}

/// Partial update, `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub selling_price: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub stock_quantity: Option<i32>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err(InventoryError::Invalid("Product name must not be empty".to_string()));
        }
        validate_amounts(self.selling_price, self.unit_cost, self.stock_quantity)
    }
}

/// Largest value a `Decimal(12, 2)` price or cost column holds
pub fn max_unit_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Largest value a `Decimal(14, 2)` total column holds
pub fn max_total_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

fn validate_amounts(
    selling_price: Option<Decimal>,
    unit_cost: Option<Decimal>,
    stock_quantity: Option<i32>,
) -> Result<(), InventoryError> {
    if selling_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(InventoryError::Invalid("Selling price must not be negative".to_string()));
    }
    if unit_cost.is_some_and(|c| c < Decimal::ZERO) {
        return Err(InventoryError::Invalid("Unit cost must not be negative".to_string()));
    }
    if selling_price.is_some_and(|p| p > max_unit_amount()) || unit_cost.is_some_and(|c| c > max_unit_amount()) {
        return Err(InventoryError::Invalid(format!(
            "Prices and costs must not exceed {}",
            max_unit_amount()
        )));
    }
    if stock_quantity.is_some_and(|s| s < 0) {
        return Err(InventoryError::Invalid("Stock quantity must not be negative".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub product_id: i32,
    pub quantity: i32,
    /// Defaults to the product's current selling price
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct NewSale {
    pub sold_at: DateTime<Utc>,
    pub note: Option<String>,
    pub items: Vec<NewSaleItem>,
}

#[derive(Debug, Clone)]
pub struct RecordedSale {
    pub sale: sales::Model,
    pub items: Vec<sale_items::Model>,
    /// Products whose stock fell to or below the low-stock threshold with this sale
    pub low_stock: Vec<products::Model>,
}

pub async fn create_product(
    db: &DatabaseConnection,
    new: NewProduct,
) -> Result<products::Model, InventoryError> {
    new.validate()?;

    let txn = db.begin().await?;
    let now = Utc::now();

    let product = products::ActiveModel {
        name: Set(new.name.trim().to_string()),
        sku: Set(new.sku),
        category: Set(new.category),
        selling_price: Set(new.selling_price),
        unit_cost: Set(new.unit_cost),
        stock_quantity: Set(new.stock_quantity),
        created_at: Set(Some(now.into())),
        updated_at: Set(Some(now.into())),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    record_price(&txn, product.id, product.selling_price, now).await?;
    txn.commit().await?;

    tracing::info!("Created product {} ({})", product.id, product.name);
    Ok(product)
}

/// Returns the updated product and whether its selling price changed
pub async fn update_product(
    db: &DatabaseConnection,
    id: i32,
    update: ProductUpdate,
) -> Result<(products::Model, bool), InventoryError> {
    update.validate()?;

    let txn = db.begin().await?;
    let existing = Products::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| InventoryError::NotFound(format!("Product {} not found", id)))?;

    let previous_price = existing.selling_price;
    let now = Utc::now();
    let mut active: products::ActiveModel = existing.into();

    if let Some(name) = update.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(sku) = update.sku {
        active.sku = Set(Some(sku));
    }
    if let Some(category) = update.category {
        active.category = Set(Some(category));
    }
    if let Some(price) = update.selling_price {
        active.selling_price = Set(price);
    }
    if let Some(cost) = update.unit_cost {
        active.unit_cost = Set(cost);
    }
    if let Some(stock) = update.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    active.updated_at = Set(Some(now.into()));

    let product = active.update(&txn).await?;

    let price_changed = product.selling_price != previous_price;
    if price_changed {
        record_price(&txn, product.id, product.selling_price, now).await?;
        tracing::info!(
            "Price of product {} changed {} -> {}",
            product.id,
            previous_price,
            product.selling_price
        );
    }

    txn.commit().await?;
    Ok((product, price_changed))
}

/// Products with recorded sales cannot be deleted
pub async fn delete_product(db: &DatabaseConnection, id: i32) -> Result<(), InventoryError> {
    let sold = SaleItems::find()
        .filter(sale_items::Column::ProductId.eq(id))
        .count(db)
        .await?;

    if sold > 0 {
        return Err(InventoryError::Conflict(format!(
            "Product {} has {} recorded sale lines and cannot be deleted",
            id, sold
        )));
    }

    let result = Products::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(InventoryError::NotFound(format!("Product {} not found", id)));
    }

    tracing::info!("Deleted product {}", id);
    Ok(())
}

/// Add (positive) or remove (negative) stock
pub async fn adjust_stock(
    db: &DatabaseConnection,
    id: i32,
    delta: i32,
) -> Result<products::Model, InventoryError> {
    let txn = db.begin().await?;
    let product = Products::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| InventoryError::NotFound(format!("Product {} not found", id)))?;

    let new_stock = apply_stock_delta(product.stock_quantity, delta)?;

    let mut active: products::ActiveModel = product.into();
    active.stock_quantity = Set(new_stock);
    active.updated_at = Set(Some(Utc::now().into()));
    let product = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!("Stock of product {} adjusted by {} to {}", id, delta, new_stock);
    Ok(product)
}

pub fn apply_stock_delta(current: i32, delta: i32) -> Result<i32, InventoryError> {
    match current.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        _ => Err(InventoryError::Invalid(format!(
            "Insufficient stock: {} available, adjustment of {}",
            current, delta
        ))),
    }
}

/// Price times quantity, rejected when it overflows or does not fit a total column
pub fn line_total(unit_price: Decimal, quantity: i32) -> Result<Decimal, InventoryError> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .filter(|total| *total <= max_total_amount())
        .ok_or_else(|| {
            InventoryError::Invalid(format!(
                "Line total for {} x {} is out of range",
                quantity, unit_price
            ))
        })
}

/// Requested units per product; lines for the same product share its stock
fn requested_quantities(items: &[NewSaleItem]) -> Result<HashMap<i32, i32>, InventoryError> {
    let mut requested: HashMap<i32, i32> = HashMap::new();
    for item in items {
        let entry = requested.entry(item.product_id).or_default();
        *entry = entry.checked_add(item.quantity).ok_or_else(|| {
            InventoryError::Invalid(format!(
                "Total quantity for product {} is too large",
                item.product_id
            ))
        })?;
    }
    Ok(requested)
}

/// Product rows are locked until commit, so concurrent sales of the same
/// product queue behind each other instead of both passing the stock check.
pub async fn record_sale(
    db: &DatabaseConnection,
    new: NewSale,
    low_stock_threshold: i32,
) -> Result<RecordedSale, InventoryError> {
    if new.items.is_empty() {
        return Err(InventoryError::Invalid("A sale needs at least one item".to_string()));
    }
    if let Some(item) = new.items.iter().find(|i| i.quantity <= 0) {
        return Err(InventoryError::Invalid(format!(
            "Quantity for product {} must be positive",
            item.product_id
        )));
    }
    if new.items.iter().any(|i| i.unit_price.is_some_and(|p| p < Decimal::ZERO)) {
        return Err(InventoryError::Invalid("Unit price must not be negative".to_string()));
    }
    if new.items.iter().any(|i| i.unit_price.is_some_and(|p| p > max_unit_amount())) {
        return Err(InventoryError::Invalid(format!(
            "Unit price must not exceed {}",
            max_unit_amount()
        )));
    }

    let requested = requested_quantities(&new.items)?;

    let txn = db.begin().await?;

    let mut catalogue: HashMap<i32, products::Model> = HashMap::new();
    for (&product_id, &quantity) in &requested {
        let product = Products::find_by_id(product_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| InventoryError::NotFound(format!("Product {} not found", product_id)))?;

        if product.stock_quantity < quantity {
            return Err(InventoryError::Invalid(format!(
                "Insufficient stock for {}: {} available, {} requested",
                product.name, product.stock_quantity, quantity
            )));
        }
        catalogue.insert(product_id, product);
    }

    let mut lines: Vec<(i32, i32, Decimal, Decimal)> = Vec::with_capacity(new.items.len());
    for item in &new.items {
        let unit_price = item
            .unit_price
            .unwrap_or_else(|| catalogue[&item.product_id].selling_price);
        let total = line_total(unit_price, item.quantity)?;
        lines.push((item.product_id, item.quantity, unit_price, total));
    }

    let total = lines
        .iter()
        .try_fold(Decimal::ZERO, |sum, (_, _, _, line)| sum.checked_add(*line))
        .filter(|total| *total <= max_total_amount())
        .ok_or_else(|| InventoryError::Invalid("Sale total is out of range".to_string()))?;

    let sale = sales::ActiveModel {
        sold_at: Set(new.sold_at.into()),
        total_amount: Set(total),
        note: Set(new.note),
        created_at: Set(Some(Utc::now().into())),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (product_id, quantity, unit_price, amount) in lines {
        let item = sale_items::ActiveModel {
            sale_id: Set(sale.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            total_amount: Set(amount),
            returned_quantity: Set(0),
            sold_at: Set(sale.sold_at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    let mut low_stock = Vec::new();
    for (product_id, quantity) in requested {
        let Some(product) = catalogue.remove(&product_id) else {
            continue;
        };
        let before = product.stock_quantity;
        let after = before - quantity;

        let mut active: products::ActiveModel = product.into();
        active.stock_quantity = Set(after);
        active.updated_at = Set(Some(Utc::now().into()));
        let updated = active.update(&txn).await?;

        if crossed_threshold(before, after, low_stock_threshold) {
            low_stock.push(updated);
        }
    }

    txn.commit().await?;

    tracing::info!(
        "Recorded sale {} with {} lines, total {}",
        sale.id,
        items.len(),
        sale.total_amount
    );

    Ok(RecordedSale {
        sale,
        items,
        low_stock,
    })
}

/// One already-parsed import row. The product is found by id or, failing that, by SKU.
#[derive(Debug, Clone)]
pub struct ImportRow {
    pub product_id: Option<i32>,
    pub sku: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub sold_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportRowOutcome {
    /// Zero-based position in the submitted rows
    pub row: usize,
    pub sale_id: Option<i32>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
    pub rows: Vec<ImportRowOutcome>,
    pub low_stock: Vec<products::Model>,
}

/// A database failure stopped the import. Rows in `summary` were committed
/// before it happened.
#[derive(Debug, thiserror::Error)]
#[error("Import aborted after {} imported rows: {source}", .summary.imported)]
pub struct ImportAborted {
    pub summary: ImportSummary,
    #[source]
    pub source: InventoryError,
}

/// Import each row as its own single-line sale. Row-level problems are
/// reported per row; database failures abort the import.
pub async fn import_sales(
    db: &DatabaseConnection,
    rows: Vec<ImportRow>,
    low_stock_threshold: i32,
) -> Result<ImportSummary, ImportAborted> {
    let mut summary = ImportSummary::default();

    for (index, row) in rows.into_iter().enumerate() {
        let outcome = match import_row(db, row, low_stock_threshold).await {
            Ok(recorded) => {
                summary.imported += 1;
                summary.low_stock.extend(recorded.low_stock);
                ImportRowOutcome {
                    row: index,
                    sale_id: Some(recorded.sale.id),
                    error: None,
                }
            }
            Err(InventoryError::Database(e)) => {
                tracing::error!("Import aborted at row {}: {}", index, e);
                return Err(ImportAborted {
                    summary,
                    source: InventoryError::Database(e),
                });
            }
            Err(e) => {
                tracing::warn!("Import row {} rejected: {}", index, e);
                summary.failed += 1;
                ImportRowOutcome {
                    row: index,
                    sale_id: None,
                    error: Some(e.to_string()),
                }
            }
        };
        summary.rows.push(outcome);
    }

    tracing::info!(
        "Sales import finished: {} imported, {} failed",
        summary.imported,
        summary.failed
    );

    Ok(summary)
}

async fn import_row(
    db: &DatabaseConnection,
    row: ImportRow,
    low_stock_threshold: i32,
) -> Result<RecordedSale, InventoryError> {
    let product_id = match (row.product_id, row.sku.as_deref()) {
        (Some(id), _) => id,
        (None, Some(sku)) => Products::find()
            .filter(products::Column::Sku.eq(sku))
            .one(db)
            .await?
            .map(|p| p.id)
            .ok_or_else(|| InventoryError::NotFound(format!("No product with SKU '{}'", sku)))?,
        (None, None) => {
            return Err(InventoryError::Invalid(
                "Row needs a product id or SKU".to_string(),
            ))
        }
    };

    let sale = NewSale {
        sold_at: row.sold_at.unwrap_or_else(Utc::now),
        note: Some("Imported".to_string()),
        items: vec![NewSaleItem {
            product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }],
    };

    record_sale(db, sale, low_stock_threshold).await
}

#[derive(Debug, Clone)]
pub struct RecordedReturn {
    pub item: sale_items::Model,
    pub product: products::Model,
}

/// Returned units on a line after taking back `quantity` more
pub fn apply_return(sold: i32, already_returned: i32, quantity: i32) -> Result<i32, InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::Invalid("Return quantity must be positive".to_string()));
    }
    match already_returned.checked_add(quantity) {
        Some(returned) if returned <= sold => Ok(returned),
        _ => Err(InventoryError::Invalid(format!(
            "Cannot return {} units: {} sold, {} already returned",
            quantity, sold, already_returned
        ))),
    }
}

/// Take back units of a sale line and put them back in stock. The line and
/// its product stay locked until commit.
pub async fn record_return(
    db: &DatabaseConnection,
    sale_item_id: i32,
    quantity: i32,
) -> Result<RecordedReturn, InventoryError> {
    if quantity <= 0 {
        return Err(InventoryError::Invalid("Return quantity must be positive".to_string()));
    }

    let txn = db.begin().await?;
    let item = SaleItems::find_by_id(sale_item_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| InventoryError::NotFound(format!("Sale line {} not found", sale_item_id)))?;

    let returned = apply_return(item.quantity, item.returned_quantity, quantity)?;
    let product_id = item.product_id;

    let mut active: sale_items::ActiveModel = item.into();
    active.returned_quantity = Set(returned);
    let item = active.update(&txn).await?;

    let product = Products::find_by_id(product_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| InventoryError::NotFound(format!("Product {} not found", product_id)))?;
    let restocked = apply_stock_delta(product.stock_quantity, quantity)?;

    let mut active: products::ActiveModel = product.into();
    active.stock_quantity = Set(restocked);
    active.updated_at = Set(Some(Utc::now().into()));
    let product = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        "Returned {} units of sale line {}; product {} stock now {}",
        quantity,
        sale_item_id,
        product_id,
        restocked
    );

    Ok(RecordedReturn { item, product })
}

/// True when stock moves from above the threshold to at or below it
pub fn crossed_threshold(before: i32, after: i32, threshold: i32) -> bool {
    before > threshold && after <= threshold
}

async fn record_price<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
    price: Decimal,
    at: DateTime<Utc>,
) -> Result<price_history::Model, DbErr> {
    price_history::ActiveModel {
        product_id: Set(product_id),
        price: Set(price),
        effective_at: Set(at.into()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn new_product() -> NewProduct {
        NewProduct {
            name: "Rye bread".to_string(),
            sku: Some("BRD-RYE".to_string()),
            category: Some("bakery".to_string()),
            selling_price: dec!(4.50),
            unit_cost: dec!(1.80),
            stock_quantity: 20,
        }
    }

    #[test]
    fn test_new_product_validation() {
        assert!(new_product().validate().is_ok());

        let mut blank = new_product();
        blank.name = "  ".to_string();
        assert!(matches!(blank.validate(), Err(InventoryError::Invalid(_))));

        let mut negative = new_product();
        negative.unit_cost = dec!(-0.01);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_update_validation() {
        assert!(ProductUpdate::default().validate().is_ok());

        let update = ProductUpdate {
            stock_quantity: Some(-1),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_stock_delta() {
        assert_eq!(apply_stock_delta(5, 3).unwrap(), 8);
        assert_eq!(apply_stock_delta(5, -5).unwrap(), 0);
        assert!(apply_stock_delta(5, -6).is_err());
        assert!(apply_stock_delta(i32::MAX, 1).is_err());
    }

    #[test]
    fn test_crossed_threshold() {
        assert!(crossed_threshold(12, 10, 10));
        assert!(crossed_threshold(11, 0, 10));
        assert!(!crossed_threshold(10, 8, 10));
        assert!(!crossed_threshold(30, 20, 10));
    }

    #[test]
    fn test_apply_return() {
        assert_eq!(apply_return(5, 0, 2).unwrap(), 2);
        assert_eq!(apply_return(5, 2, 3).unwrap(), 5);
        assert!(apply_return(5, 2, 4).is_err());
        assert!(apply_return(5, 0, 0).is_err());
        assert!(apply_return(5, i32::MAX, 1).is_err());
    }

    #[test]
    fn test_line_total_bounds() {
        assert_eq!(line_total(dec!(4.50), 3).unwrap(), dec!(13.50));
        assert!(line_total(Decimal::MAX, 2).is_err());
        assert!(line_total(max_unit_amount(), 1_000).is_err());
    }

    #[test]
    fn test_requested_quantities_merge_and_overflow() {
        let item = |product_id, quantity| NewSaleItem {
            product_id,
            quantity,
            unit_price: None,
        };

        let merged = requested_quantities(&[item(1, 2), item(2, 1), item(1, 3)]).unwrap();
        assert_eq!(merged[&1], 5);
        assert_eq!(merged[&2], 1);

        assert!(requested_quantities(&[item(1, i32::MAX), item(1, 1)]).is_err());
    }

    fn stocked(id: i32, price: Decimal, stock: i32) -> products::Model {
        products::Model {
            id,
            name: format!("Product {}", id),
            sku: None,
            category: None,
            selling_price: price,
            unit_cost: dec!(1.00),
            stock_quantity: stock,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_record_sale_locks_products_and_totals_lines() {
        let sold_at = Utc::now();
        let sale = sales::Model {
            id: 7,
            sold_at: sold_at.into(),
            total_amount: dec!(13.50),
            note: None,
            created_at: None,
        };
        let line = sale_items::Model {
            id: 70,
            sale_id: 7,
            product_id: 1,
            quantity: 3,
            unit_price: dec!(4.50),
            total_amount: dec!(13.50),
            returned_quantity: 0,
            sold_at: sold_at.into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stocked(1, dec!(4.50), 12)]])
            .append_query_results([vec![sale]])
            .append_query_results([vec![line]])
            .append_query_results([vec![stocked(1, dec!(4.50), 9)]])
            .into_connection();

        let new = NewSale {
            sold_at,
            note: None,
            items: vec![NewSaleItem {
                product_id: 1,
                quantity: 3,
                unit_price: None,
            }],
        };
        let recorded = record_sale(&db, new, 10).await.unwrap();

        assert_eq!(recorded.items.len(), 1);
        assert_eq!(recorded.low_stock.len(), 1);
        assert_eq!(recorded.low_stock[0].stock_quantity, 9);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("FOR UPDATE"));
        // Line total computed from the catalogue price
        assert!(log.contains("13.50"));
    }

    #[tokio::test]
    async fn test_record_sale_rejects_overflowing_price() {
        // Rejected before any query runs
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let new = NewSale {
            sold_at: Utc::now(),
            note: None,
            items: vec![NewSaleItem {
                product_id: 1,
                quantity: 2,
                unit_price: Some(Decimal::MAX),
            }],
        };

        let result = record_sale(&db, new, 10).await;
        assert!(matches!(result, Err(InventoryError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_record_return_restocks() {
        let line = sale_items::Model {
            id: 70,
            sale_id: 7,
            product_id: 1,
            quantity: 3,
            unit_price: dec!(4.50),
            total_amount: dec!(13.50),
            returned_quantity: 1,
            sold_at: Utc::now().into(),
        };
        let updated_line = sale_items::Model {
            returned_quantity: 3,
            ..line.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![line]])
            .append_query_results([vec![updated_line]])
            .append_query_results([vec![stocked(1, dec!(4.50), 9)]])
            .append_query_results([vec![stocked(1, dec!(4.50), 11)]])
            .into_connection();

        let recorded = record_return(&db, 70, 2).await.unwrap();
        assert_eq!(recorded.item.returned_quantity, 3);
        assert_eq!(recorded.product.stock_quantity, 11);

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("FOR UPDATE"));
    }

    #[tokio::test]
    async fn test_record_return_beyond_sold_quantity() {
        let line = sale_items::Model {
            id: 70,
            sale_id: 7,
            product_id: 1,
            quantity: 3,
            unit_price: dec!(4.50),
            total_amount: dec!(13.50),
            returned_quantity: 2,
            sold_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![line]])
            .into_connection();

        let result = record_return(&db, 70, 2).await;
        assert!(matches!(result, Err(InventoryError::Invalid(_))));
    }

    #[test]
    fn test_error_messages() {
        let err = InventoryError::NotFound("Product 4 not found".to_string());
        assert_eq!(err.to_string(), "Product 4 not found");
    }
}
