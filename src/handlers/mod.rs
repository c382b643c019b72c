use axum::{http::StatusCode, Json};

use crate::entities::products as product_entity;
use crate::models::error::ErrorResponse;
use crate::services::inventory::InventoryError;
use crate::services::notifier::{Notification, NotificationKind};
use crate::AppState;

pub mod analytics;
pub mod notifications;
pub mod products;
pub mod sales;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn bad_request(error: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(error, "INVALID_REQUEST")),
    )
}

pub(crate) fn internal_error(context: &str, e: impl std::fmt::Display) -> ApiError {
    tracing::error!(error = %e, "{}", context);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!("{}: {}", context, e), "DATABASE_ERROR")),
    )
}

impl From<InventoryError> for ErrorResponse {
    fn from(e: InventoryError) -> Self {
        let code = match &e {
            InventoryError::NotFound(_) => "NOT_FOUND",
            InventoryError::Invalid(_) => "INVALID_REQUEST",
            InventoryError::Conflict(_) => "CONFLICT",
            InventoryError::Database(_) => "DATABASE_ERROR",
        };
        ErrorResponse::new(e.to_string(), code)
    }
}

pub(crate) fn inventory_error(e: InventoryError) -> ApiError {
    let status = match &e {
        InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::Invalid(_) => StatusCode::BAD_REQUEST,
        InventoryError::Conflict(_) => StatusCode::CONFLICT,
        InventoryError::Database(db) => {
            tracing::error!(error = %db, "Database error in inventory operation");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::from(e)))
}

/// Tell the notifier about products that just fell to the low-stock threshold
pub(crate) async fn notify_low_stock(state: &AppState, low_stock: &[product_entity::Model]) {
    for product in low_stock {
        state
            .notifier
            .notify(Notification::new(
                NotificationKind::LowStock,
                format!(
                    "{} (#{}) is low on stock: {} left",
                    product.name, product.id, product.stock_quantity
                ),
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_inventory_error_status() {
        let (status, body) = inventory_error(InventoryError::NotFound("Product 3 not found".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code.as_deref(), Some("NOT_FOUND"));

        let (status, _) = inventory_error(InventoryError::Conflict("sold".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = inventory_error(InventoryError::Database(DbErr::Custom("down".to_string())));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Database error: Custom Error: down");
    }
}
