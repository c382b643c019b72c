//! Revenue / profit maximizing price within a bounded change
//!
//! With constant elasticity `e`, revenue peaks at `p * e / (1 + e)` and
//! profit at `cost / (1 + 1/e)`. The optimum is then clamped so a single
//! suggestion never moves price by more than the configured bounds.

use serde::Serialize;

/// Allowed relative price move, e.g. `-0.2..=0.2` for ±20%
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBounds {
    pub min_pct: f64,
    pub max_pct: f64,
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self {
            min_pct: -0.20,
            max_pct: 0.20,
        }
    }
}

impl PriceBounds {
    /// Bounds in either order. A non-finite bound falls back to its default.
    pub fn new(min_pct: f64, max_pct: f64) -> Self {
        let defaults = Self::default();
        let (min_pct, max_pct) = match (min_pct.is_finite(), max_pct.is_finite()) {
            (true, true) => (min_pct, max_pct),
            (false, true) => (defaults.min_pct.min(max_pct), max_pct),
            (true, false) => (min_pct, defaults.max_pct.max(min_pct)),
            (false, false) => (defaults.min_pct, defaults.max_pct),
        };

        if min_pct <= max_pct {
            Self { min_pct, max_pct }
        } else {
            Self {
                min_pct: max_pct,
                max_pct: min_pct,
            }
        }
    }

    pub fn clamp(&self, current_price: f64, price: f64) -> f64 {
        let low = current_price * (1.0 + self.min_pct);
        let high = current_price * (1.0 + self.max_pct);
        // NaN-safe, unlike f64::clamp
        price.max(low).min(high)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedPrice {
    pub optimized_price: f64,
    pub expected_sales_change_pct: f64,
    pub expected_revenue_change_pct: f64,
}

impl OptimizedPrice {
    fn unchanged(current_price: f64) -> Self {
        Self {
            optimized_price: current_price,
            expected_sales_change_pct: 0.0,
            expected_revenue_change_pct: 0.0,
        }
    }
}

pub fn optimize_price(
    current_price: f64,
    elasticity: f64,
    bounds: PriceBounds,
    cost_price: Option<f64>,
) -> OptimizedPrice {
    if elasticity >= 0.0 || !elasticity.is_finite() || current_price <= 0.0 {
        return OptimizedPrice::unchanged(current_price);
    }

    let unconstrained = match cost_price.filter(|c| *c > 0.0) {
        Some(cost) => cost / (1.0 + 1.0 / elasticity),
        None => current_price * (elasticity / (1.0 + elasticity)),
    };

    // Unit elasticity has no finite optimum; push to whichever bound the sign points at
    let unconstrained = if unconstrained.is_finite() {
        unconstrained
    } else if unconstrained.is_sign_negative() {
        0.0
    } else {
        f64::MAX
    };

    let optimized_price = bounds.clamp(current_price, unconstrained);
    let (expected_sales_change_pct, expected_revenue_change_pct) =
        expected_changes(current_price, optimized_price, elasticity);

    OptimizedPrice {
        optimized_price,
        expected_sales_change_pct,
        expected_revenue_change_pct,
    }
}

/// Expected (sales %, revenue %) change when moving from `current_price` to `new_price`
pub fn expected_changes(current_price: f64, new_price: f64, elasticity: f64) -> (f64, f64) {
    if current_price <= 0.0 {
        return (0.0, 0.0);
    }

    let price_change_pct = new_price / current_price - 1.0;
    let sales_change_pct = price_change_pct * elasticity * 100.0;
    let revenue_change_pct =
        (1.0 + price_change_pct) * (1.0 + price_change_pct * elasticity) * 100.0 - 100.0;

    (sales_change_pct, revenue_change_pct)
}
