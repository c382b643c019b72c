use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::Value;
use std::sync::Arc;
use stockroom_backend::{
    app,
    config::AppConfig,
    entities::{products, sale_items, sales},
    services::notifier::{Notification, NotificationKind, NotificationPreferences, Notifier},
    AppState,
};
use tower::ServiceExt;

/// Collects notifications instead of logging them
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) {
        self.sent.lock().push(notification);
    }
}

impl RecordingNotifier {
    #[allow(dead_code)]
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent.lock().iter().map(|n| n.kind).collect()
    }
}

/// Empty mock database; tests append the rows their requests will read
pub fn mock_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

pub fn test_app(db: DatabaseConnection) -> (Router, Arc<RecordingNotifier>) {
    let recorder = Arc::new(RecordingNotifier::default());
    let config = AppConfig {
        database_url: "postgres://unused".to_string(),
        ..Default::default()
    };
    let state = AppState::with_notifier(
        Arc::new(db),
        config,
        recorder.clone(),
        Arc::new(NotificationPreferences::default()),
    );

    (app(state), recorder)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };

    (status, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn product(id: i32, name: &str, price: i64, cost: i64, stock: i32) -> products::Model {
    products::Model {
        id,
        name: name.to_string(),
        sku: Some(format!("SKU-{}", id)),
        category: Some("General".to_string()),
        selling_price: Decimal::from(price),
        unit_cost: Decimal::from(cost),
        stock_quantity: stock,
        created_at: None,
        updated_at: None,
    }
}

#[allow(dead_code)]
pub fn sale_line(id: i32, product_id: i32, quantity: i32, total: i64, sold_at: DateTime<Utc>) -> sale_items::Model {
    sale_items::Model {
        id,
        sale_id: id,
        product_id,
        quantity,
        unit_price: Decimal::from(total) / Decimal::from(quantity.max(1)),
        total_amount: Decimal::from(total),
        returned_quantity: 0,
        sold_at: sold_at.into(),
    }
}

#[allow(dead_code)]
pub fn sale(id: i32, total: i64, sold_at: DateTime<Utc>) -> sales::Model {
    sales::Model {
        id,
        sold_at: sold_at.into(),
        total_amount: Decimal::from(total),
        note: None,
        created_at: None,
    }
}
