//! Runtime configuration from environment variables (`.env` is loaded in `main`)

use std::env;
use std::str::FromStr;

use crate::services::elasticity::DEFAULT_LOOKBACK_DAYS;
use crate::services::forecaster::DEFAULT_HISTORY_MONTHS;
use crate::services::notifier::{NotificationKind, NotificationPreferences};
use crate::services::price_optimizer::PriceBounds;
use crate::services::price_suggestions::SuggestionSettings;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub analytics_cache_ttl_secs: u64,
    pub low_stock_threshold: i32,
    pub price_lookback_days: i64,
    pub price_min_change_pct: f64,
    pub price_max_change_pct: f64,
    pub competitive_factor: f64,
    pub forecast_history_months: u32,
    /// Comma separated `NotificationKind` names, `None` enables all
    pub notify_kinds: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            bind_addr: "0.0.0.0:3000".to_string(),
            analytics_cache_ttl_secs: 60,
            low_stock_threshold: 10,
            price_lookback_days: DEFAULT_LOOKBACK_DAYS,
            price_min_change_pct: -0.20,
            price_max_change_pct: 0.20,
            competitive_factor: 1.0,
            forecast_history_months: DEFAULT_HISTORY_MONTHS,
            notify_kinds: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;
        let defaults = Self::default();

        Ok(Self {
            database_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            analytics_cache_ttl_secs: parse_or("ANALYTICS_CACHE_TTL_SECS", defaults.analytics_cache_ttl_secs),
            low_stock_threshold: parse_or("LOW_STOCK_THRESHOLD", defaults.low_stock_threshold),
            price_lookback_days: parse_or("PRICE_LOOKBACK_DAYS", defaults.price_lookback_days),
            price_min_change_pct: finite_or("PRICE_MIN_CHANGE_PCT", defaults.price_min_change_pct),
            price_max_change_pct: finite_or("PRICE_MAX_CHANGE_PCT", defaults.price_max_change_pct),
            competitive_factor: finite_or("COMPETITIVE_FACTOR", defaults.competitive_factor),
            forecast_history_months: parse_or("FORECAST_HISTORY_MONTHS", defaults.forecast_history_months),
            notify_kinds: env::var("NOTIFY_KINDS").ok(),
        })
    }

    pub fn suggestion_settings(&self) -> SuggestionSettings {
        SuggestionSettings {
            lookback_days: self.price_lookback_days,
            bounds: PriceBounds::new(self.price_min_change_pct, self.price_max_change_pct),
            competitive_factor: self.competitive_factor,
        }
    }

    pub fn notification_preferences(&self) -> NotificationPreferences {
        match &self.notify_kinds {
            Some(list) => NotificationPreferences::parse(list),
            None => NotificationPreferences::new(NotificationKind::ALL),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw, default),
        Err(_) => default,
    }
}

/// Like `parse_or`, but NaN and infinities also fall back to the default
fn finite_or(key: &str, default: f64) -> f64 {
    match env::var(key) {
        Ok(raw) => parse_finite(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_finite(key: &str, raw: &str, default: f64) -> f64 {
    let value = parse_value(key, raw, default);
    if value.is_finite() {
        value
    } else {
        tracing::warn!("Non-finite value '{}' for {}, using default", raw, key);
        default
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!("Invalid value '{}' for {}, using default", raw, key);
            default
        }
    }
}
