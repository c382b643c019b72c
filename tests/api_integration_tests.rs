mod common;

use axum::http::StatusCode;
use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use sea_orm::Value as DbValue;
use serde_json::json;
use std::collections::BTreeMap;
use stockroom_backend::entities::{price_history, products, sale_items};
use stockroom_backend::services::notifier::NotificationKind;

use crate::common::{get, json_request, mock_db, product, sale, sale_line, send, test_app};

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app(mock_db().into_connection());

    let (status, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Hello from Stockroom Backend!"));
}

#[tokio::test]
async fn test_list_products() {
    let db = mock_db()
        .append_query_results([vec![product(1, "Tea", 12, 5, 40), product(2, "Mug", 8, 3, 4)]])
        .into_connection();
    let (app, _) = test_app(db);

    let (status, body) = send(&app, get("/api/products")).await;

    assert_eq!(status, StatusCode::OK);
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["name"], "Tea");
    assert_eq!(products[0]["sellingPrice"], 12.0);
    assert_eq!(products[1]["stockQuantity"], 4);
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let db = mock_db()
        .append_query_results([Vec::<products::Model>::new()])
        .into_connection();
    let (app, _) = test_app(db);

    let (status, body) = send(&app, get("/api/products/42")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["error"], "Product 42 not found");
}

#[tokio::test]
async fn test_create_product_validation() {
    let (app, _) = test_app(mock_db().into_connection());

    let (status, body) = send(
        &app,
        json_request("POST", "/api/products", json!({"name": "  ", "sellingPrice": 4.5})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_delete_product_with_sales_conflicts() {
    let count_row = BTreeMap::from([("num_items", DbValue::BigInt(Some(3)))]);
    let db = mock_db().append_query_results([vec![count_row]]).into_connection();
    let (app, _) = test_app(db);

    let request = axum::http::Request::builder()
        .method("DELETE")
        .uri("/api/products/1")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_stock_adjustment_below_threshold_notifies() {
    let db = mock_db()
        .append_query_results([vec![product(3, "Filters", 6, 2, 12)]])
        .append_query_results([vec![product(3, "Filters", 6, 2, 8)]])
        .into_connection();
    let (app, recorder) = test_app(db);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/products/3/stock", json!({"delta": -4})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stockQuantity"], 8);
    assert_eq!(recorder.kinds(), vec![NotificationKind::LowStock]);
}

#[tokio::test]
async fn test_empty_sale_rejected() {
    let (app, recorder) = test_app(mock_db().into_connection());

    let (status, _) = send(&app, json_request("POST", "/api/sales", json!({"items": []}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(recorder.kinds().is_empty());
}

#[tokio::test]
async fn test_list_sales_rejects_bad_date() {
    let (app, _) = test_app(mock_db().into_connection());

    let (status, body) = send(&app, get("/api/sales?start_date=yesterday")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("start_date"));
}

#[tokio::test]
async fn test_optimal_products() {
    let now = Utc::now();
    let db = mock_db()
        .append_query_results([vec![product(1, "Tea", 20, 10, 100), product(2, "Kettle", 40, 30, 5)]])
        .append_query_results([vec![sale_line(1, 1, 10, 200, now - Duration::days(2))]])
        .into_connection();
    let (app, _) = test_app(db);

    let (status, body) = send(&app, get("/api/analytics/optimal-products?days=30")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"], 30);

    // Kettle never sold, so only Tea is ranked
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], 1);
    // 0.25*100 + 0.20*100 + 0.15*100 + 0.20*2 + 0.20*96
    assert_eq!(products[0]["score"], 80);
    assert_eq!(
        products[0]["reason"],
        "High performer with strong margins and sales velocity"
    );
    assert_eq!(products[0]["metrics"]["profitMargin"], 50.0);
}

#[tokio::test]
async fn test_optimal_products_rejects_zero_days() {
    let (app, _) = test_app(mock_db().into_connection());

    let (status, _) = send(&app, get("/api/analytics/optimal-products?days=0")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_projected_earnings_extends_trend() {
    let current_month = {
        let today = Utc::now().date_naive();
        NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap()
    };
    let first_month = current_month - Months::new(6);

    let lines: Vec<sale_items::Model> = (0..6)
        .map(|i| {
            let day = (first_month + Months::new(i as u32)) + Duration::days(14);
            let sold_at = day.and_hms_opt(12, 0, 0).unwrap().and_utc();
            sale_line(i + 1, 1, 1, 10_000 + 1_000 * i64::from(i), sold_at)
        })
        .collect();

    let db = mock_db().append_query_results([lines]).into_connection();
    let (app, _) = test_app(db);

    let (status, body) = send(
        &app,
        get("/api/analytics/projected-earnings?months=6&future_months=3"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let earnings = body["earnings"].as_array().unwrap();
    assert_eq!(earnings.len(), 9);

    assert_eq!(earnings[0]["month"], first_month.format("%Y-%m").to_string());
    assert_eq!(earnings[0]["actual"], 10000.0);
    assert!(earnings[0]["projected"].is_null());

    let projected: Vec<f64> = earnings[6..]
        .iter()
        .map(|e| e["projected"].as_f64().unwrap())
        .collect();
    assert_eq!(projected, vec![16000.0, 17000.0, 18000.0]);
    assert!(earnings[8]["actual"].is_null());
}

#[tokio::test]
async fn test_margins_are_cached_until_write() {
    let db = mock_db()
        .append_query_results([vec![product(1, "Tea", 20, 5, 40), product(2, "Mug", 10, 6, 12)]])
        // Stock adjustment reads then writes product 2
        .append_query_results([vec![product(2, "Mug", 10, 6, 12)]])
        .append_query_results([vec![product(2, "Mug", 10, 6, 20)]])
        .append_query_results([vec![product(1, "Tea", 20, 10, 40), product(2, "Mug", 10, 6, 20)]])
        .into_connection();
    let (app, _) = test_app(db);

    let (first_status, first) = send(&app, get("/api/analytics/margins")).await;
    let (_, cached) = send(&app, get("/api/analytics/margins")).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(first, cached);
    assert_eq!(first["products"][0]["productId"], 1);
    assert_eq!(first["products"][0]["marginPct"], 75.0);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/products/2/stock", json!({"delta": 8})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, fresh) = send(&app, get("/api/analytics/margins")).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(first, fresh);
    let tea = fresh["products"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["productId"] == 1)
        .unwrap();
    assert_eq!(tea["marginPct"], 50.0);
}

#[tokio::test]
async fn test_price_suggestions_without_history() {
    let db = mock_db()
        .append_query_results([vec![product(1, "Tea", 20, 10, 100)]])
        .append_query_results([Vec::<price_history::Model>::new()])
        .append_query_results([Vec::<sale_items::Model>::new()])
        .into_connection();
    let (app, _) = test_app(db);

    let (status, body) = send(&app, get("/api/analytics/price-suggestions")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lookbackDays"], 90);
    // Fallback elasticity -1.2 with cost 10: optimum 60 clamps to 24 and
    // rounds to 19.99, a revenue change far below the 1% threshold
    assert_eq!(body["suggestions"], json!([]));
}

#[tokio::test]
async fn test_low_stock_default_threshold() {
    let db = mock_db()
        .append_query_results([vec![
            product(1, "Tea", 20, 10, 100),
            product(2, "Mug", 8, 3, 4),
            product(3, "Filters", 6, 2, 10),
        ]])
        .into_connection();
    let (app, _) = test_app(db);

    let (status, body) = send(&app, get("/api/analytics/low-stock")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["threshold"], 10);
    let ids: Vec<i64> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["productId"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn test_notification_preferences_round_trip() {
    let (app, _) = test_app(mock_db().into_connection());

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/notifications/preferences",
            json!({"disable": ["low_stock", "sale_recorded"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], json!(["import_completed", "price_changed"]));

    let (_, body) = send(&app, get("/api/notifications/preferences")).await;
    assert_eq!(body["enabled"], json!(["import_completed", "price_changed"]));
}

#[tokio::test]
async fn test_create_sale_decrements_stock_and_notifies() {
    let now = Utc::now();
    let mut line = sale_line(70, 1, 3, 15, now);
    line.sale_id = 7;
    let db = mock_db()
        .append_query_results([vec![product(1, "Tea", 5, 2, 12)]])
        .append_query_results([vec![sale(7, 15, now)]])
        .append_query_results([vec![line]])
        .append_query_results([vec![product(1, "Tea", 5, 2, 9)]])
        .into_connection();
    let (app, recorder) = test_app(db);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/sales", json!({"items": [{"productId": 1, "quantity": 3}]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 7);
    assert_eq!(body["totalAmount"], 15.0);
    assert_eq!(body["items"][0]["quantity"], 3);
    assert_eq!(body["items"][0]["unitPrice"], 5.0);
    // 12 -> 9 crosses the default threshold of 10
    assert_eq!(
        recorder.kinds(),
        vec![NotificationKind::SaleRecorded, NotificationKind::LowStock]
    );
}

#[tokio::test]
async fn test_create_sale_rejects_overflowing_unit_price() {
    let (app, recorder) = test_app(mock_db().into_connection());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/sales",
            json!({"items": [{"productId": 1, "quantity": 2, "unitPrice": "79228162514264337593543950335"}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert!(recorder.kinds().is_empty());
}

#[tokio::test]
async fn test_import_reports_each_row() {
    let now = Utc::now();
    let mut line = sale_line(90, 3, 4, 24, now);
    line.sale_id = 9;
    let db = mock_db()
        // SKU lookup
        .append_query_results([vec![product(3, "Filters", 6, 2, 40)]])
        .append_query_results([vec![product(3, "Filters", 6, 2, 40)]])
        .append_query_results([vec![sale(9, 24, now)]])
        .append_query_results([vec![line]])
        .append_query_results([vec![product(3, "Filters", 6, 2, 36)]])
        .into_connection();
    let (app, recorder) = test_app(db);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/sales/import",
            json!({"rows": [
                {"sku": "SKU-3", "quantity": 4},
                {"quantity": 1},
                {"productId": 3, "quantity": 0}
            ]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 1);
    assert_eq!(body["failed"], 2);

    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows[0], json!({"row": 0, "saleId": 9}));
    assert_eq!(rows[1]["row"], 1);
    assert_eq!(rows[1]["error"], "Row needs a product id or SKU");
    assert!(rows[2]["error"].as_str().unwrap().contains("must be positive"));
    assert!(rows[2].get("saleId").is_none());

    assert_eq!(recorder.kinds(), vec![NotificationKind::ImportCompleted]);
}

#[tokio::test]
async fn test_import_failure_keeps_committed_rows_visible() {
    let now = Utc::now();
    let mut line = sale_line(80, 3, 4, 24, now);
    line.sale_id = 8;
    let db = mock_db()
        .append_query_results([vec![product(3, "Filters", 6, 2, 12)]])
        // Row 0 commits; row 1 finds the result queue empty
        .append_query_results([vec![product(3, "Filters", 6, 2, 12)]])
        .append_query_results([vec![sale(8, 24, now)]])
        .append_query_results([vec![line]])
        .append_query_results([vec![product(3, "Filters", 6, 2, 8)]])
        .into_connection();
    let (app, recorder) = test_app(db);

    let (status, _) = send(&app, get("/api/analytics/margins")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/sales/import",
            json!({"rows": [{"productId": 3, "quantity": 4}, {"productId": 3, "quantity": 1}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "DATABASE_ERROR");
    // Row 0 took stock from 12 to 8
    assert_eq!(recorder.kinds(), vec![NotificationKind::LowStock]);

    // The cached margins were dropped, so this reads the (now empty) database again
    let (status, _) = send(&app, get("/api/analytics/margins")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_return_restocks_product() {
    let line = sale_line(70, 1, 3, 15, Utc::now());
    let mut returned = line.clone();
    returned.returned_quantity = 2;

    let db = mock_db()
        .append_query_results([vec![line]])
        .append_query_results([vec![returned]])
        .append_query_results([vec![product(1, "Tea", 5, 2, 5)]])
        .append_query_results([vec![product(1, "Tea", 5, 2, 7)]])
        .into_connection();
    let (app, _) = test_app(db);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/sales/lines/70/returns", json!({"quantity": 2})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["line"]["id"], 70);
    assert_eq!(body["line"]["returnedQuantity"], 2);
    assert_eq!(body["stockQuantity"], 7);
}

#[tokio::test]
async fn test_return_more_than_sold_rejected() {
    let mut line = sale_line(70, 1, 3, 15, Utc::now());
    line.returned_quantity = 2;
    let db = mock_db().append_query_results([vec![line]]).into_connection();
    let (app, _) = test_app(db);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/sales/lines/70/returns", json!({"quantity": 2})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot return 2 units: 3 sold, 2 already returned");
}

#[tokio::test]
async fn test_return_of_unknown_line_is_404() {
    let db = mock_db()
        .append_query_results([Vec::<sale_items::Model>::new()])
        .into_connection();
    let (app, _) = test_app(db);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/sales/lines/99/returns", json!({"quantity": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Sale line 99 not found");
}
