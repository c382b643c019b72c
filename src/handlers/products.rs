//! Product catalogue and stock endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{EntityTrait, QueryOrder};
use tracing::info;

use crate::entities::{prelude::Products, products};
use crate::handlers::{inventory_error, internal_error, notify_low_stock, ApiError};
use crate::models::product::{
    CreateProductRequest, ProductListResponse, ProductResponse, StockAdjustmentRequest,
    UpdateProductRequest,
};
use crate::services::inventory::{self, crossed_threshold, InventoryError};
use crate::services::notifier::{Notification, NotificationKind};
use crate::AppState;

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products = Products::find()
        .order_by_asc(products::Column::Id)
        .all(state.db.as_ref())
        .await
        .map_err(|e| internal_error("Failed to load products", e))?;

    Ok(Json(ProductListResponse {
        products: products.into_iter().map(ProductResponse::from).collect(),
    }))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = Products::find_by_id(id)
        .one(state.db.as_ref())
        .await
        .map_err(|e| internal_error("Failed to load product", e))?
        .ok_or_else(|| inventory_error(InventoryError::NotFound(format!("Product {} not found", id))))?;

    Ok(Json(ProductResponse::from(product)))
}

/// POST /api/products
///
/// # Response
/// - 201: Created product
/// - 400: Empty name or negative price, cost or stock
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = inventory::create_product(&state.db, payload.into())
        .await
        .map_err(inventory_error)?;

    state.cache.invalidate_all();

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

/// PUT /api/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let (product, price_changed) = inventory::update_product(&state.db, id, payload.into())
        .await
        .map_err(inventory_error)?;

    state.cache.invalidate_all();

    if price_changed {
        state
            .notifier
            .notify(Notification::new(
                NotificationKind::PriceChanged,
                format!("{} (#{}) now sells at {}", product.name, product.id, product.selling_price),
            ))
            .await;
    }

    Ok(Json(ProductResponse::from(product)))
}

/// DELETE /api/products/{id}
///
/// # Response
/// - 204: Deleted
/// - 404: Unknown product
/// - 409: Product has recorded sales
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    inventory::delete_product(&state.db, id)
        .await
        .map_err(inventory_error)?;

    state.cache.invalidate_all();

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/products/{id}/stock
///
/// Adds a signed delta to the stock level. Stock never goes below zero.
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<StockAdjustmentRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    info!(product_id = id, delta = payload.delta, "Adjusting stock");

    let product = inventory::adjust_stock(&state.db, id, payload.delta)
        .await
        .map_err(inventory_error)?;

    state.cache.invalidate_all();

    let before = product.stock_quantity - payload.delta;
    if crossed_threshold(before, product.stock_quantity, state.config.low_stock_threshold) {
        notify_low_stock(&state, std::slice::from_ref(&product)).await;
    }

    Ok(Json(ProductResponse::from(product)))
}
