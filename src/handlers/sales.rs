//! Sales entry, listing, returns and bulk import

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::info;

use crate::entities::{prelude::SaleItems, sale_items};
use crate::handlers::{bad_request, inventory_error, internal_error, notify_low_stock, ApiError};
use crate::models::sale::{
    CreateSaleRequest, DateRangeQuery, ImportRowResponse, ImportSalesRequest, ImportSalesResponse,
    ReturnRequest, ReturnResponse, SaleItemResponse, SaleLinesResponse, SaleResponse,
};
use crate::services::inventory::{self, ImportRow};
use crate::services::notifier::{Notification, NotificationKind};
use crate::AppState;

/// GET /api/sales?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD
///
/// Sale lines in the range, oldest first. Both bounds are optional and the
/// end date is inclusive.
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<SaleLinesResponse>, ApiError> {
    let range = query.validate().map_err(bad_request)?;

    let mut select = SaleItems::find();
    if let Some(start) = range.start {
        select = select.filter(sale_items::Column::SoldAt.gte(start));
    }
    if let Some(end) = range.end {
        select = select.filter(sale_items::Column::SoldAt.lt(end));
    }

    let lines = select
        .order_by_asc(sale_items::Column::SoldAt)
        .order_by_asc(sale_items::Column::Id)
        .all(state.db.as_ref())
        .await
        .map_err(|e| internal_error("Failed to load sales", e))?;

    Ok(Json(SaleLinesResponse {
        lines: lines.into_iter().map(SaleItemResponse::from).collect(),
    }))
}

/// POST /api/sales
///
/// # Response
/// - 201: Recorded sale with its lines
/// - 400: Empty sale, bad quantity or insufficient stock
/// - 404: Unknown product
pub async fn create_sale(
    State(state): State<AppState>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), ApiError> {
    let recorded = inventory::record_sale(&state.db, payload.into(), state.config.low_stock_threshold)
        .await
        .map_err(inventory_error)?;

    state.cache.invalidate_all();

    state
        .notifier
        .notify(Notification::new(
            NotificationKind::SaleRecorded,
            format!(
                "Sale #{} recorded: {} lines, total {}",
                recorded.sale.id,
                recorded.items.len(),
                recorded.sale.total_amount
            ),
        ))
        .await;
    notify_low_stock(&state, &recorded.low_stock).await;

    Ok((
        StatusCode::CREATED,
        Json(SaleResponse::new(recorded.sale, recorded.items)),
    ))
}

/// POST /api/sales/import
///
/// Each row becomes its own sale. Rows that fail validation are reported
/// and skipped; a database failure aborts the import.
pub async fn import_sales(
    State(state): State<AppState>,
    Json(payload): Json<ImportSalesRequest>,
) -> Result<Json<ImportSalesResponse>, ApiError> {
    if payload.rows.is_empty() {
        return Err(bad_request("Import needs at least one row"));
    }

    info!(rows = payload.rows.len(), "Importing sales");

    let rows: Vec<ImportRow> = payload.rows.into_iter().map(ImportRow::from).collect();
    let summary = match inventory::import_sales(&state.db, rows, state.config.low_stock_threshold).await {
        Ok(summary) => summary,
        Err(aborted) => {
            // Rows before the failure are committed
            if aborted.summary.imported > 0 {
                state.cache.invalidate_all();
            }
            notify_low_stock(&state, &aborted.summary.low_stock).await;
            return Err(inventory_error(aborted.source));
        }
    };

    if summary.imported > 0 {
        state.cache.invalidate_all();
    }

    state
        .notifier
        .notify(Notification::new(
            NotificationKind::ImportCompleted,
            format!(
                "Sales import finished: {} imported, {} failed",
                summary.imported, summary.failed
            ),
        ))
        .await;
    notify_low_stock(&state, &summary.low_stock).await;

    Ok(Json(ImportSalesResponse {
        imported: summary.imported,
        failed: summary.failed,
        rows: summary.rows.into_iter().map(ImportRowResponse::from).collect(),
    }))
}

/// POST /api/sales/lines/{id}/returns
///
/// # Response
/// - 200: Updated line and the product's new stock level
/// - 400: Quantity not positive or more than was sold
/// - 404: Unknown sale line
pub async fn record_return(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ReturnRequest>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let recorded = inventory::record_return(&state.db, id, payload.quantity)
        .await
        .map_err(inventory_error)?;

    state.cache.invalidate_all();

    Ok(Json(ReturnResponse {
        line: SaleItemResponse::from(recorded.item),
        stock_quantity: recorded.product.stock_quantity,
    }))
}
