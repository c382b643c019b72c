//! Analytics and reporting endpoints
//!
//! Every response is memoized in the analytics cache, keyed by endpoint and
//! parameters. Writes elsewhere clear the cache.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use crate::handlers::{bad_request, internal_error, ApiError};
use crate::models::analytics::{
    LowStockQuery, LowStockResponse, MarginsResponse, OptimalProductsQuery, OptimalProductsResponse,
    PeakHoursQuery, PriceSuggestionsQuery, PriceSuggestionsResponse, ProjectedEarningsQuery,
    ProjectedEarningsResponse, SalesMetricsResponse, TopSellersQuery, TopSellersResponse,
};
use crate::models::sale::DateRangeQuery;
use crate::services::analytics_cache::ComputeError;
use crate::services::forecaster::forecast_monthly;
use crate::services::metrics::compute_metrics;
use crate::services::price_suggestions::{fetch_price_suggestions, SuggestionSettings};
use crate::services::product_scorer::{fetch_optimal_products, SalesWindow};
use crate::services::reports;
use crate::services::sales_data::{
    fetch_monthly_totals, fetch_product_sales_summary, fetch_products, fetch_sales_records,
    sale_totals, DateRange,
};
use crate::AppState;

/// GET /api/analytics/metrics?start_date&end_date
///
/// Distribution of sale totals and of line quantities.
pub async fn get_sales_metrics(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Value>, ApiError> {
    let range = query.validate().map_err(bad_request)?;
    let key = format!("metrics:{:?}:{:?}", range.start, range.end);

    let value = state
        .cache
        .get_or_compute(key, async {
            let records = fetch_sales_records(&state.db, range).await?;
            let quantities: Vec<f64> = records.iter().map(|r| f64::from(r.quantity)).collect();

            Ok::<_, ComputeError>(SalesMetricsResponse {
                sales: compute_metrics(&sale_totals(&records)),
                quantities: compute_metrics(&quantities),
            })
        })
        .await
        .map_err(|e| internal_error("Failed to compute sales metrics", e))?;

    Ok(Json(value))
}

/// GET /api/analytics/top-sellers?limit&start_date&end_date
pub async fn get_top_sellers(
    State(state): State<AppState>,
    Query(query): Query<TopSellersQuery>,
) -> Result<Json<Value>, ApiError> {
    let (limit, range) = query.validate().map_err(bad_request)?;
    let key = format!("top-sellers:{}:{:?}:{:?}", limit, range.start, range.end);

    let value = state
        .cache
        .get_or_compute(key, async {
            let products = fetch_products(&state.db).await?;
            let summaries = fetch_product_sales_summary(&state.db, range).await?;

            Ok::<_, ComputeError>(TopSellersResponse {
                top_sellers: reports::top_sellers(&products, &summaries, limit),
            })
        })
        .await
        .map_err(|e| internal_error("Failed to compute top sellers", e))?;

    Ok(Json(value))
}

/// GET /api/analytics/low-stock?threshold
pub async fn get_low_stock(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Value>, ApiError> {
    let threshold = query
        .validate(state.config.low_stock_threshold)
        .map_err(bad_request)?;

    let value = state
        .cache
        .get_or_compute(format!("low-stock:{}", threshold), async {
            let products = fetch_products(&state.db).await?;

            Ok::<_, ComputeError>(LowStockResponse {
                threshold,
                products: reports::low_stock(&products, threshold),
            })
        })
        .await
        .map_err(|e| internal_error("Failed to compute low stock report", e))?;

    Ok(Json(value))
}

/// GET /api/analytics/margins
pub async fn get_margins(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let value = state
        .cache
        .get_or_compute("margins".to_string(), async {
            let products = fetch_products(&state.db).await?;

            Ok::<_, ComputeError>(MarginsResponse {
                products: reports::margins(&products),
            })
        })
        .await
        .map_err(|e| internal_error("Failed to compute margins", e))?;

    Ok(Json(value))
}

/// GET /api/analytics/price-suggestions?lookback_days
///
/// Only suggestions expected to lift revenue by more than 1% are returned,
/// best first.
pub async fn get_price_suggestions(
    State(state): State<AppState>,
    Query(query): Query<PriceSuggestionsQuery>,
) -> Result<Json<Value>, ApiError> {
    let lookback_days = query
        .validate(state.config.price_lookback_days)
        .map_err(bad_request)?;
    let settings = SuggestionSettings {
        lookback_days,
        ..state.config.suggestion_settings()
    };

    info!(lookback_days, "Computing price suggestions");

    let value = state
        .cache
        .get_or_compute(format!("price-suggestions:{}", lookback_days), async {
            let suggestions = fetch_price_suggestions(&state.db, &settings, Utc::now()).await?;

            Ok::<_, ComputeError>(PriceSuggestionsResponse {
                lookback_days,
                suggestions,
            })
        })
        .await
        .map_err(|e| internal_error("Failed to compute price suggestions", e))?;

    Ok(Json(value))
}

/// GET /api/analytics/optimal-products?days&limit
pub async fn get_optimal_products(
    State(state): State<AppState>,
    Query(query): Query<OptimalProductsQuery>,
) -> Result<Json<Value>, ApiError> {
    let (days, limit) = query.validate().map_err(bad_request)?;
    let window = SalesWindow {
        as_of: Utc::now(),
        days,
    };

    let value = state
        .cache
        .get_or_compute(format!("optimal-products:{}:{}", days, limit), async {
            let products = fetch_optimal_products(&state.db, window, limit).await?;

            Ok::<_, ComputeError>(OptimalProductsResponse { days, products })
        })
        .await
        .map_err(|e| internal_error("Failed to score products", e))?;

    Ok(Json(value))
}

/// GET /api/analytics/projected-earnings?months&future_months
///
/// `months` complete months of actual revenue followed by `future_months`
/// of linear projection.
pub async fn get_projected_earnings(
    State(state): State<AppState>,
    Query(query): Query<ProjectedEarningsQuery>,
) -> Result<Json<Value>, ApiError> {
    let (months, future_months) = query
        .validate(state.config.forecast_history_months)
        .map_err(bad_request)?;

    let value = state
        .cache
        .get_or_compute(format!("projected-earnings:{}:{}", months, future_months), async {
            let totals = fetch_monthly_totals(&state.db, Utc::now(), months).await?;

            Ok::<_, ComputeError>(ProjectedEarningsResponse {
                earnings: forecast_monthly(&totals, future_months),
            })
        })
        .await
        .map_err(|e| internal_error("Failed to project earnings", e))?;

    Ok(Json(value))
}

/// GET /api/analytics/peak-hours?days
pub async fn get_peak_hours(
    State(state): State<AppState>,
    Query(query): Query<PeakHoursQuery>,
) -> Result<Json<Value>, ApiError> {
    let days = query.validate().map_err(bad_request)?;

    let value = state
        .cache
        .get_or_compute(format!("peak-hours:{}", days), async {
            let records = fetch_sales_records(&state.db, DateRange::trailing_days(Utc::now(), days)).await?;

            Ok::<_, ComputeError>(reports::peak_hours(&records))
        })
        .await
        .map_err(|e| internal_error("Failed to compute peak hours", e))?;

    Ok(Json(value))
}
