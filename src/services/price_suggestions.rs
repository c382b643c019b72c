//! Price suggestion pipeline
//!
//! price history + sale lines -> elasticity -> bounded optimum -> factor
//! adjustment and nice-price rounding -> threshold filter -> ranked list.

use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::services::elasticity::{
    estimate_elasticity, Confidence, LookbackWindow, DEFAULT_LOOKBACK_DAYS, SALES_WINDOW_DAYS,
};
use crate::services::price_optimizer::{expected_changes, optimize_price, PriceBounds};
use crate::services::pricing_factors::{
    apply_factors, inventory_factor, seasonality_factor, PricingFactors, MIN_REVENUE_IMPROVEMENT_PCT,
};
use crate::services::sales_data::{
    average_daily_units, build_price_change_events, fetch_price_history, fetch_products,
    fetch_sales_records, DateRange, PricePoint, ProductSnapshot, SalesRecord,
};

#[derive(Debug, Clone, Copy)]
pub struct SuggestionSettings {
    pub lookback_days: i64,
    pub bounds: PriceBounds,
    pub competitive_factor: f64,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            bounds: PriceBounds::default(),
            competitive_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceElasticityResult {
    pub product_id: i32,
    pub product_name: String,
    pub current_price: f64,
    pub suggested_price: f64,
    pub price_elasticity: f64,
    /// Percent
    pub expected_sales_change: f64,
    /// Percent
    pub expected_revenue_change: f64,
    pub confidence: Confidence,
    /// Price changes inside the lookback window
    pub history_data_points: usize,
    pub factors: PricingFactors,
}

/// Suggestion for one product, `None` when elasticity is unusable or the
/// expected revenue gain does not clear the threshold.
pub fn suggest_price(
    product: &ProductSnapshot,
    history: &[PricePoint],
    sales: &[SalesRecord],
    settings: &SuggestionSettings,
    as_of: DateTime<Utc>,
) -> Option<PriceElasticityResult> {
    let current_price = product.selling_price;
    if current_price <= 0.0 {
        return None;
    }

    let lookback = LookbackWindow::new(as_of, settings.lookback_days);
    let events = build_price_change_events(history, sales, as_of);
    let estimate = estimate_elasticity(&events, lookback);

    if !estimate.is_valid() {
        tracing::debug!(
            "Skipping {}: elasticity {:.3} is not negative",
            product.name,
            estimate.elasticity
        );
        return None;
    }

    let optimized = optimize_price(
        current_price,
        estimate.elasticity,
        settings.bounds,
        Some(product.unit_cost),
    );

    let recent_days = SALES_WINDOW_DAYS.min(settings.lookback_days).max(1);
    let recent_velocity = average_daily_units(
        sales,
        as_of - Duration::days(recent_days),
        as_of,
        recent_days as f64,
    );
    let baseline_velocity = average_daily_units(
        sales,
        lookback.start(),
        as_of,
        settings.lookback_days.max(1) as f64,
    );

    let factors = PricingFactors {
        competitive_factor: settings.competitive_factor,
        seasonality_factor: seasonality_factor(recent_velocity, baseline_velocity),
        inventory_factor: inventory_factor(product.stock_quantity, recent_velocity),
        ..Default::default()
    };

    let suggested_price = apply_factors(optimized.optimized_price, &factors);
    let (expected_sales_change, expected_revenue_change) =
        expected_changes(current_price, suggested_price, estimate.elasticity);

    if expected_revenue_change <= MIN_REVENUE_IMPROVEMENT_PCT {
        tracing::debug!(
            "Dropping suggestion for {}: {:.2} -> {:.2} only changes revenue by {:.2}%",
            product.name,
            current_price,
            suggested_price,
            expected_revenue_change
        );
        return None;
    }

    let history_data_points = events
        .iter()
        .filter(|e| e.previous_price.is_some() && lookback.contains(e.effective_at))
        .count();

    Some(PriceElasticityResult {
        product_id: product.id,
        product_name: product.name.clone(),
        current_price,
        suggested_price,
        price_elasticity: estimate.elasticity,
        expected_sales_change,
        expected_revenue_change,
        confidence: estimate.confidence,
        history_data_points,
        factors,
    })
}

/// Suggestions for every product, best expected revenue gain first
pub fn build_suggestions(
    products: &[ProductSnapshot],
    history: &[PricePoint],
    sales: &[SalesRecord],
    settings: &SuggestionSettings,
    as_of: DateTime<Utc>,
) -> Vec<PriceElasticityResult> {
    let mut suggestions: Vec<PriceElasticityResult> = products
        .iter()
        .filter_map(|product| {
            let product_history: Vec<PricePoint> = history
                .iter()
                .filter(|p| p.product_id == product.id)
                .copied()
                .collect();
            let product_sales: Vec<SalesRecord> = sales
                .iter()
                .filter(|s| s.product_id == product.id)
                .cloned()
                .collect();

            suggest_price(product, &product_history, &product_sales, settings, as_of)
        })
        .collect();

    suggestions.sort_by(|a, b| b.expected_revenue_change.total_cmp(&a.expected_revenue_change));
    suggestions
}

pub async fn fetch_price_suggestions(
    db: &DatabaseConnection,
    settings: &SuggestionSettings,
    as_of: DateTime<Utc>,
) -> Result<Vec<PriceElasticityResult>, Box<dyn std::error::Error + Send + Sync>> {
    let products = fetch_products(db).await?;
    let history = fetch_price_history(db).await?;

    // Events at the start of the lookback need a full window of sales before them
    let sales_range = DateRange::trailing_days(
        as_of + Duration::seconds(1),
        settings.lookback_days + SALES_WINDOW_DAYS,
    );
    let sales = fetch_sales_records(db, sales_range).await?;

    let suggestions = build_suggestions(&products, &history, &sales, settings, as_of);

    tracing::info!(
        "Built {} price suggestions from {} products",
        suggestions.len(),
        products.len()
    );

    Ok(suggestions)
}
