// src/lib.rs

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;

use config::AppConfig;
use services::analytics_cache::AnalyticsCache;
use services::notifier::{NotificationPreferences, Notifier, PreferenceFilteredNotifier, TracingNotifier};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub cache: AnalyticsCache,
    pub notifier: Arc<dyn Notifier>,
    pub preferences: Arc<NotificationPreferences>,
}

impl AppState {
    /// Log-delivered notifications filtered by the configured preferences
    pub fn new(db: Arc<DatabaseConnection>, config: AppConfig) -> Self {
        let preferences = Arc::new(config.notification_preferences());
        Self::with_notifier(db, config, Arc::new(TracingNotifier), preferences)
    }

    pub fn with_notifier(
        db: Arc<DatabaseConnection>,
        config: AppConfig,
        delivery: Arc<dyn Notifier>,
        preferences: Arc<NotificationPreferences>,
    ) -> Self {
        let notifier: Arc<dyn Notifier> =
            Arc::new(PreferenceFilteredNotifier::new(delivery, preferences.clone()));

        Self {
            db,
            cache: AnalyticsCache::new(config.analytics_cache_ttl_secs),
            config: Arc::new(config),
            notifier,
            preferences,
        }
    }
}

pub mod entities {
    pub mod prelude;
    pub mod price_history;
    pub mod products;
    pub mod sale_items;
    pub mod sales;
}

pub mod services {
    pub mod analytics_cache;
    pub mod elasticity;
    pub mod forecaster;
    pub mod inventory;
    pub mod metrics;
    pub mod notifier;
    pub mod price_optimizer;
    pub mod price_suggestions;
    pub mod pricing_factors;
    pub mod product_scorer;
    pub mod reports;
    pub mod sales_data;
}

pub mod config;
pub mod db;
pub mod handlers;
pub mod models;

use handlers::{analytics, notifications, products, sales};

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello_stockroom))
        // Products
        .route("/api/products", get(products::list_products).post(products::create_product))
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/products/{id}/stock", post(products::adjust_stock))
        // Sales
        .route("/api/sales", get(sales::list_sales).post(sales::create_sale))
        .route("/api/sales/import", post(sales::import_sales))
        .route("/api/sales/lines/{id}/returns", post(sales::record_return))
        // Analytics
        .route("/api/analytics/metrics", get(analytics::get_sales_metrics))
        .route("/api/analytics/top-sellers", get(analytics::get_top_sellers))
        .route("/api/analytics/low-stock", get(analytics::get_low_stock))
        .route("/api/analytics/margins", get(analytics::get_margins))
        .route("/api/analytics/price-suggestions", get(analytics::get_price_suggestions))
        .route("/api/analytics/optimal-products", get(analytics::get_optimal_products))
        .route("/api/analytics/projected-earnings", get(analytics::get_projected_earnings))
        .route("/api/analytics/peak-hours", get(analytics::get_peak_hours))
        // Notifications
        .route(
            "/api/notifications/preferences",
            get(notifications::get_preferences).put(notifications::update_preferences),
        )
        .with_state(state)
}

async fn hello_stockroom() -> &'static str {
    "Hello from Stockroom Backend!"
}
