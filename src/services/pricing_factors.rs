//! Secondary pricing adjustments and consumer-facing rounding

use serde::Serialize;

/// Suggestions below this expected revenue improvement (percent) are dropped
pub const MIN_REVENUE_IMPROVEMENT_PCT: f64 = 1.0;

/// Stock lasting fewer days than this is considered scarce
pub const SCARCE_STOCK_DAYS: f64 = 7.0;
/// Stock lasting more days than this is considered overstocked
pub const OVERSTOCK_DAYS: f64 = 90.0;

const SCARCE_STOCK_FACTOR: f64 = 1.05;
const OVERSTOCK_FACTOR: f64 = 0.95;
const SEASONALITY_MIN: f64 = 0.95;
const SEASONALITY_MAX: f64 = 1.05;

/// Multiplicative adjustments, 1.0 is neutral
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingFactors {
    pub cost_factor: f64,
    pub competitive_factor: f64,
    pub seasonality_factor: f64,
    pub inventory_factor: f64,
}

impl Default for PricingFactors {
    fn default() -> Self {
        Self {
            cost_factor: 1.0,
            competitive_factor: 1.0,
            seasonality_factor: 1.0,
            inventory_factor: 1.0,
        }
    }
}

impl PricingFactors {
    pub fn combined(&self) -> f64 {
        self.cost_factor * self.competitive_factor * self.seasonality_factor * self.inventory_factor
    }
}

pub fn apply_factors(base_price: f64, factors: &PricingFactors) -> f64 {
    round_to_nice_price_point(base_price * factors.combined())
}

/// Round to a price ending in 9s:
/// - below 10: `floor + 0.99`
/// - 10 to 100: down to the ten, minus a cent (47.23 -> 39.99)
/// - 100 and above: down to the hundred, minus one (150 -> 99)
pub fn round_to_nice_price_point(price: f64) -> f64 {
    if price < 10.0 {
        price.floor() + 0.99
    } else if price < 100.0 {
        (price / 10.0).floor() * 10.0 - 0.01
    } else {
        (price / 100.0).floor() * 100.0 - 1.0
    }
}

/// Nudge price up when stock is scarce and down when it sits on the shelf.
///
/// `avg_daily_sales` of zero means no cover can be computed and the factor stays neutral.
pub fn inventory_factor(stock_quantity: i32, avg_daily_sales: f64) -> f64 {
    if stock_quantity <= 0 || avg_daily_sales <= 0.0 {
        return 1.0;
    }

    let days_of_cover = stock_quantity as f64 / avg_daily_sales;
    if days_of_cover < SCARCE_STOCK_DAYS {
        SCARCE_STOCK_FACTOR
    } else if days_of_cover > OVERSTOCK_DAYS {
        OVERSTOCK_FACTOR
    } else {
        1.0
    }
}

/// Ratio of recent to long-run sales velocity, clamped to ±5%
pub fn seasonality_factor(recent_daily_sales: f64, baseline_daily_sales: f64) -> f64 {
    if baseline_daily_sales <= 0.0 {
        return 1.0;
    }

    (recent_daily_sales / baseline_daily_sales).clamp(SEASONALITY_MIN, SEASONALITY_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_nice_price_below_ten() {
        assert!(close(round_to_nice_price_point(7.10), 7.99));
        assert!(close(round_to_nice_price_point(0.5), 0.99));
    }

    #[test]
    fn test_nice_price_tens() {
        assert!(close(round_to_nice_price_point(47.23), 39.99));
        assert!(close(round_to_nice_price_point(10.0), 9.99));
    }

    #[test]
    fn test_nice_price_hundreds() {
        assert!(close(round_to_nice_price_point(150.0), 99.0));
        assert!(close(round_to_nice_price_point(1234.5), 1199.0));
    }

    #[test]
    fn test_neutral_factors_only_round() {
        let factors = PricingFactors::default();
        assert!(close(apply_factors(5.4, &factors), 5.99));
    }

    #[test]
    fn test_factors_multiply() {
        let factors = PricingFactors {
            cost_factor: 1.0,
            competitive_factor: 2.0,
            seasonality_factor: 1.0,
            inventory_factor: 1.5,
        };
        // 3.0 * 3.0 = 9.0
        assert!(close(apply_factors(3.0, &factors), 9.99));
    }

    #[test]
    fn test_inventory_factor() {
        assert_eq!(inventory_factor(10, 5.0), SCARCE_STOCK_FACTOR);
        assert_eq!(inventory_factor(1000, 5.0), OVERSTOCK_FACTOR);
        assert_eq!(inventory_factor(100, 5.0), 1.0);
        assert_eq!(inventory_factor(100, 0.0), 1.0);
        assert_eq!(inventory_factor(0, 5.0), 1.0);
    }

    #[test]
    fn test_seasonality_factor_clamped() {
        assert_eq!(seasonality_factor(20.0, 10.0), SEASONALITY_MAX);
        assert_eq!(seasonality_factor(1.0, 10.0), SEASONALITY_MIN);
        assert!(close(seasonality_factor(10.2, 10.0), 1.02));
        assert_eq!(seasonality_factor(3.0, 0.0), 1.0);
    }
}
